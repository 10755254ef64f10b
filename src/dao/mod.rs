/// Lenient decoders for the store's field encodings.
pub mod fields;
/// Row and entity definitions.
pub mod models;
/// Row store abstraction and its backends.
pub mod row_store;
/// Storage error types shared by every backend.
pub mod storage;
