pub mod snapshot_reader;

pub use snapshot_reader::PgSnapshotReader;
