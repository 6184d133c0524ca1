// Vendor secure-erase support for SSDs.
//
// - ssd.rs: the `SecureEraseUnit` seam, its hdparm implementation and the
//   set-password / erase-unit sequence run by the engine

pub mod ssd;


pub use ssd::{HdparmSecureErase, SecureEraseUnit, SecurityState, SsdWipe};
