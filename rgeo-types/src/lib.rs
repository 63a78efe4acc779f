//! # rgeo-types
//!
//! Record types shared by the rgeo reverse geocoder.
//!
//! - **Location**: the flat metadata record attached to every indexed region
//!   and returned from every successful lookup.
//!
//! All types are serializable with Serde.
//!
//! ## Examples
//!
//! ```rust
//! use rgeo_types::location::Location;
//!
//! let country = Location {
//!     country: "France".into(),
//!     country_code_2: "FR".into(),
//!     ..Location::default()
//! };
//! let province = Location {
//!     province: "Île-de-France".into(),
//!     ..Location::default()
//! };
//!
//! let merged = country.combine(&province);
//! assert_eq!(merged.country, "France");
//! assert_eq!(merged.province, "Île-de-France");
//! ```

pub mod location;

pub use location::Location;
