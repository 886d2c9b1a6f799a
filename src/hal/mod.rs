//! Register-level abstractions
//!
//! Everything above the chunk transport reaches the MAC-PHY through
//! [`RegisterAccess`]:
//!
//! - [`registers`]: The register access trait, implemented by [`crate::Tc6`]
//! - [`mdio`]: MDIO bus view of the integrated PHY's register maps

pub mod mdio;
pub mod registers;

// Re-export commonly used types
pub use mdio::{MdioBus, Tc6Mdio};
pub use registers::RegisterAccess;
