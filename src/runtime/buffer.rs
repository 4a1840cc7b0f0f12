//! Scoped output buffering

use std::mem;

/// What happens to buffered output when the guard goes out of scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Flush,
    Discard,
}

/// Buffer that resolves into its sink on every exit path
///
/// Output written while the guard is alive is collected separately; when the
/// guard drops (normally or through `?`), the buffer is appended to the sink
/// or thrown away according to its disposition. [`take`](Self::take) hands
/// the collected text to the caller instead.
#[derive(Debug)]
pub struct OutputBuffer<'s> {
    sink: &'s mut String,
    buffer: String,
    disposition: Disposition,
}

impl<'s> OutputBuffer<'s> {
    pub fn new(sink: &'s mut String, disposition: Disposition) -> Self {
        Self {
            sink,
            buffer: String::new(),
            disposition,
        }
    }

    /// Collect output that will be dropped unless taken
    pub fn discarding(sink: &'s mut String) -> Self {
        Self::new(sink, Disposition::Discard)
    }

    pub fn out(&mut self) -> &mut String {
        &mut self.buffer
    }

    pub fn set_disposition(&mut self, disposition: Disposition) {
        self.disposition = disposition;
    }

    /// End buffering and return the collected output, leaving the sink untouched
    pub fn take(mut self) -> String {
        self.disposition = Disposition::Discard;
        mem::take(&mut self.buffer)
    }
}

impl Drop for OutputBuffer<'_> {
    fn drop(&mut self) {
        match self.disposition {
            Disposition::Flush => self.sink.push_str(&self.buffer),
            Disposition::Discard => {
                if !self.buffer.is_empty() {
                    log::trace!("discarding {} bytes of buffered output", self.buffer.len());
                }
            }
        }
    }
}
