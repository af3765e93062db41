//! Digest algorithm implementations.

mod crc32;
mod md5;
mod xxh3;

pub use self::crc32::Crc32Digest;
pub use self::md5::Md5Digest;
pub use self::xxh3::Xxh3Digest;
