//! Convert Cloud Asset Inventory exports into Terraform configuration.
//!
//! Assets are matched to converters by asset type or resource name pattern,
//! converted in batches into schema-typed values and written as HCL
//! `resource` blocks.
//!
//! ```ignore
//! use cai2tf::{load_assets, services::Catalog};
//!
//! let catalog = Catalog::gcp()?;
//! let assets = load_assets(std::fs::File::open("assets.json")?)?;
//! println!("{}", catalog.convert(&assets)?);
//! ```

pub mod asset;
pub mod config;
pub mod convert;
pub mod error;
pub mod resource;
pub mod services;

pub use asset::{load_assets, Asset, AttributeTree};
pub use convert::{convert, convert_concurrent, Converter, ResourceBlock, TypedValue};
pub use error::{ConvertError, Result};
