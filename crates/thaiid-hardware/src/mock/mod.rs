//! Mock reader and card implementations for testing and development.

mod card;
mod reader;

pub use card::{CardFixture, MockCard};
pub use reader::{MOCK_READER_NAME, MockReader, MockReaderHandle};
