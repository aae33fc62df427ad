//! InfluxDB line protocol encoding.
//!
//! One record is written as
//!
//! ```text
//! measurement[,tag=value...] field=value[,field=value...] [timestamp]
//! ```
//!
//! with tags sorted by key and fields in the order they were added. The
//! encoder never writes a line terminator; framing records is up to the
//! transport.

pub mod buffer;
pub mod escape;
pub mod point;
pub mod sort;
pub mod time;

pub use buffer::ByteBuffer;
pub use escape::{escape_into, EscapeContext};
pub use point::{FieldValue, Point, DEFAULT_BUFFER_SIZE};
pub use time::TimeUnit;
