//! Engine-side half of the batched I/O handshake.

use std::sync::mpsc::{Receiver, SyncSender};

use crate::fault::Fault;

/// Engine-side channel ends plus the pending output buffer.
///
/// Every value the program outputs accumulates in the pending buffer
/// instead of being sent immediately. The buffer is delivered as one
/// ordered batch at exactly two moments: immediately before a value is
/// consumed for input (an empty batch doubles as the ready-for-input
/// signal) and once after the program terminates. Dropping the port closes
/// both channels, which is how the controller observes end-of-program.
#[derive(Debug)]
pub struct IoPort {
    input: Receiver<i64>,
    output: SyncSender<Vec<i64>>,
    pending: Vec<i64>,
}

impl IoPort {
    /// Wraps the engine-side channel ends.
    #[must_use]
    pub fn new(input: Receiver<i64>, output: SyncSender<Vec<i64>>) -> Self {
        Self {
            input,
            output,
            pending: Vec::new(),
        }
    }

    /// Appends an output value to the pending buffer.
    pub fn push(&mut self, value: i64) {
        self.pending.push(value);
    }

    /// Delivers the pending buffer as one batch, blocking until the
    /// controller receives it. An empty buffer still delivers an empty
    /// batch.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::OutputDisconnected`] when the controller has
    /// dropped the receiving end.
    pub fn flush(&mut self) -> Result<(), Fault> {
        let batch = std::mem::take(&mut self.pending);
        self.output
            .send(batch)
            .map_err(|_| Fault::OutputDisconnected)
    }

    /// Flushes, then blocks until the controller sends one input value.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::OutputDisconnected`] when the pre-input flush
    /// cannot be delivered and [`Fault::InputDisconnected`] when the
    /// controller has dropped the sending end.
    pub fn recv(&mut self) -> Result<i64, Fault> {
        self.flush()?;
        self.input.recv().map_err(|_| Fault::InputDisconnected)
    }
}

#[cfg(test)]
mod tests {
    use super::IoPort;
    use crate::fault::Fault;
    use std::sync::mpsc::sync_channel;

    // Capacity 1 lets these tests exercise the port single-threaded; the
    // engine itself always runs against capacity-zero rendezvous channels.
    fn buffered_port() -> (
        IoPort,
        std::sync::mpsc::SyncSender<i64>,
        std::sync::mpsc::Receiver<Vec<i64>>,
    ) {
        let (input_tx, input_rx) = sync_channel(1);
        let (output_tx, output_rx) = sync_channel(1);
        (IoPort::new(input_rx, output_tx), input_tx, output_rx)
    }

    #[test]
    fn flush_delivers_pending_values_in_emission_order() {
        let (mut port, _input_tx, output_rx) = buffered_port();
        port.push(1);
        port.push(2);
        port.flush().expect("receiver alive");
        assert_eq!(output_rx.recv().expect("batch"), vec![1, 2]);
    }

    #[test]
    fn flush_empties_the_buffer_so_values_are_never_duplicated() {
        let (mut port, _input_tx, output_rx) = buffered_port();
        port.push(1);
        port.flush().expect("receiver alive");
        assert_eq!(output_rx.recv().expect("batch"), vec![1]);

        port.push(2);
        port.flush().expect("receiver alive");
        assert_eq!(output_rx.recv().expect("batch"), vec![2]);
    }

    #[test]
    fn empty_buffer_still_delivers_an_empty_batch() {
        let (mut port, _input_tx, output_rx) = buffered_port();
        port.flush().expect("receiver alive");
        assert_eq!(output_rx.recv().expect("batch"), Vec::<i64>::new());
    }

    #[test]
    fn recv_flushes_before_consuming_input() {
        let (mut port, input_tx, output_rx) = buffered_port();
        port.push(9);
        input_tx.send(5).expect("buffered send");

        assert_eq!(port.recv(), Ok(5));
        assert_eq!(output_rx.recv().expect("pre-input batch"), vec![9]);
    }

    #[test]
    fn dropped_input_sender_is_a_channel_fault() {
        let (mut port, input_tx, _output_rx) = buffered_port();
        drop(input_tx);
        assert_eq!(port.recv(), Err(Fault::InputDisconnected));
    }

    #[test]
    fn dropped_output_receiver_is_a_channel_fault() {
        let (mut port, _input_tx, output_rx) = buffered_port();
        drop(output_rx);
        assert_eq!(port.flush(), Err(Fault::OutputDisconnected));
    }
}
