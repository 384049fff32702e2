//! Minimal abstraction for the byte stream to the host (USB CDC-ACM on the
//! reference hardware). Lets the bridge run on any async serial driver.
use futures_util::Future;

/// Contract to move raw bytes to and from the host asynchronously.
pub trait HostLink {
    type Error: core::fmt::Debug;
    /// Read whatever is available into `buf`, waiting until at least one
    /// byte arrives. Returns the number of bytes written into `buf`.
    ///
    /// The bridge may drop this future before it completes, so no byte may be
    /// consumed from the driver unless it is returned.
    fn read<'a>(
        &'a mut self,
        buf: &'a mut [u8],
    ) -> impl Future<Output = Result<usize, Self::Error>> + 'a;
    /// Write all of `data` to the host.
    fn write<'a>(&'a mut self, data: &'a [u8])
        -> impl Future<Output = Result<(), Self::Error>> + 'a;
}
