use std::io::{Error, Seek, Write};
use zip::ZipWriter;

/// Writers that need a closing step before the underlying sink is complete.
pub trait Finish<O> {
    fn finish(self) -> Result<O, Error>;
}

impl<W: Write + Seek> Finish<W> for ZipWriter<W> {
    fn finish(self) -> Result<W, Error> {
        ZipWriter::finish(self).map_err(Error::other)
    }
}
