use std::io::Error;

/// Pull-based source of fixed-length observation vectors.
///
/// Every vector yielded by [`next_observation`] has exactly
/// [`dimension`] entries for the lifetime of the stream.
pub trait ObservationStream {
    /// Length of every observation this stream produces.
    fn dimension(&self) -> usize;

    /// Indicates whether the stream *may* produce more observations.
    ///
    /// Finite streams return `false` once exhausted; a subsequent call to
    /// [`next_observation`] must then return `None`.
    fn has_more_observations(&self) -> bool;

    /// Produces the next observation, or `None` at end of stream.
    fn next_observation(&mut self) -> Option<Vec<f64>>;

    /// Resets the stream to its initial state. Generators re-seed their RNG
    /// and clear their counters.
    fn restart(&mut self) -> Result<(), Error>;
}
