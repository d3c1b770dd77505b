//! Host-facing machine construction and the engine thread.

use std::collections::BTreeMap;
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use crate::encoding::Opcode;
use crate::execute::{step_one, StepOutcome};
use crate::fault::Fault;
use crate::io::IoPort;
use crate::state::{MachineState, RunState};

/// An executable Denary machine instance.
///
/// Construction loads the program and creates both rendezvous channel
/// pairs; [`Machine::start`] launches the fetch-decode-execute loop on its
/// own thread. The controller talks to the running program exclusively
/// through the handshake channels and may query halt status, the latched
/// fault, the relative base, and a memory snapshot at any time.
///
/// The handshake contract for controllers: always receive a batch before
/// sending a value on the input channel, and treat output-channel closure
/// as end-of-program.
#[derive(Debug)]
pub struct Machine {
    state: Arc<Mutex<MachineState>>,
    input_tx: SyncSender<i64>,
    input_rx: Option<Receiver<i64>>,
    output_tx: Option<SyncSender<Vec<i64>>>,
    output_rx: Receiver<Vec<i64>>,
    engine: Option<JoinHandle<Result<(), Fault>>>,
}

impl Machine {
    /// Builds a machine with addresses `0..program.len()` populated from
    /// `program`.
    #[must_use]
    pub fn new(program: &[i64]) -> Self {
        let (input_tx, input_rx) = sync_channel(0);
        let (output_tx, output_rx) = sync_channel(0);

        Self {
            state: Arc::new(Mutex::new(MachineState::new(program))),
            input_tx,
            input_rx: Some(input_rx),
            output_tx: Some(output_tx),
            output_rx,
            engine: None,
        }
    }

    /// Launches the engine thread. A second call has no effect.
    ///
    /// # Panics
    ///
    /// Panics if the operating system refuses to spawn the thread.
    pub fn start(&mut self) {
        let (Some(input_rx), Some(output_tx)) = (self.input_rx.take(), self.output_tx.take())
        else {
            return;
        };

        let state = Arc::clone(&self.state);
        let port = IoPort::new(input_rx, output_tx);
        let handle = thread::Builder::new()
            .name("denary-engine".to_string())
            .spawn(move || engine_main(&state, port))
            .expect("failed to spawn engine thread");
        self.engine = Some(handle);
    }

    /// Returns a send-capable handle to the input channel.
    #[must_use]
    pub fn input(&self) -> SyncSender<i64> {
        self.input_tx.clone()
    }

    /// Returns the receive-capable handle to the output batch channel.
    #[must_use]
    pub const fn output(&self) -> &Receiver<Vec<i64>> {
        &self.output_rx
    }

    /// True once the program has executed its halt instruction.
    ///
    /// A program terminated by a fault never reports as halted; see
    /// [`Machine::fault`].
    #[must_use]
    pub fn halted(&self) -> bool {
        lock(&self.state).run_state.halted()
    }

    /// Returns the latched fault after an abnormal termination.
    #[must_use]
    pub fn fault(&self) -> Option<Fault> {
        lock(&self.state).run_state.fault()
    }

    /// Returns an ordered snapshot of every populated memory cell.
    ///
    /// The snapshot is a defensive copy; it never aliases live machine
    /// memory.
    #[must_use]
    pub fn memory(&self) -> BTreeMap<usize, i64> {
        lock(&self.state).memory.snapshot()
    }

    /// Returns the current relative base.
    #[must_use]
    pub fn relative_base(&self) -> i64 {
        lock(&self.state).relative_base
    }

    /// Waits for the engine thread to terminate and returns its outcome.
    ///
    /// Returns `Ok(())` after a clean halt, or immediately when the
    /// machine was never started. Drain the output channel before calling
    /// this: the engine blocks delivering its final batch until the
    /// controller receives it.
    ///
    /// # Errors
    ///
    /// Returns the fault that terminated the engine.
    pub fn wait(&mut self) -> Result<(), Fault> {
        let Some(handle) = self.engine.take() else {
            return lock(&self.state).run_state.fault().map_or(Ok(()), Err);
        };
        match handle.join() {
            Ok(outcome) => outcome,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

fn lock(state: &Arc<Mutex<MachineState>>) -> MutexGuard<'_, MachineState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn engine_main(state: &Arc<Mutex<MachineState>>, mut port: IoPort) -> Result<(), Fault> {
    let result = run_loop(state, &mut port);
    if let Err(fault) = result {
        let mut guard = lock(state);
        if !guard.run_state.halted() {
            guard.run_state = RunState::Faulted(fault);
        }
    }
    // The port drops here, closing both channels exactly once.
    result
}

fn run_loop(state: &Arc<Mutex<MachineState>>, port: &mut IoPort) -> Result<(), Fault> {
    loop {
        // The lock is held only while stepping; every blocking handshake
        // operation runs with the lock released.
        let outcome = {
            let mut guard = lock(state);
            step_one(&mut guard)
        };

        match outcome? {
            StepOutcome::Retired => {}
            StepOutcome::Emitted(value) => port.push(value),
            StepOutcome::AwaitInput { target } => {
                let value = port.recv()?;
                let mut guard = lock(state);
                guard.memory.write(target, value);
                guard.instruction_pointer += Opcode::Input.width();
            }
            StepOutcome::Halted => return port.flush(),
        }
    }
}
