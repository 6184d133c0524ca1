#![allow(dead_code)]

/// Common test utilities shared by the integration tests
///
/// - disk images standing in for block devices
/// - PEM key fixtures written to a temporary directory
/// - content checks on wiped files
pub mod keys;
pub mod mock_drive;
pub mod test_helpers;
