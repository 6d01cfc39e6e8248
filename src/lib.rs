#![forbid(unsafe_code)]

//! Site time series from the ERA5 / ERA5-Land reanalysis archive.
//!
//! The crate covers the two ends of a retrieval around the archive itself:
//! building the request (area around a site, variables, date enumeration,
//! output format) and turning the gridded result into a flat per-site table
//! using the nearest grid cell. Fetching is delegated to a [`Transport`].
//!
//! **Quick start**
//! ```no_run
//! use era5_site::{Client, ClientOptions, DateRange, Site, TransportOptions};
//!
//! let client = Client::http(
//!     ClientOptions::default(),
//!     TransportOptions {
//!         endpoint: "https://grids.example.org/api".to_string(),
//!         ..TransportOptions::default()
//!     },
//! )?;
//!
//! let site = Site::new(52.414, -1.143)?;
//! let table = client.retrieve_table(
//!     &site,
//!     ["2m_temperature", "surface_net_solar_radiation"],
//!     &DateRange::year(2020)?,
//! )?;
//! table.to_csv_path("weather_2020.csv")?;
//! # Ok::<(), era5_site::Error>(())
//! ```
//!
//! **Pure building blocks**
//! ```
//! use era5_site::{build_request, DateRange, Site};
//!
//! let site = Site::new(52.414, -1.143)?;
//! let req = build_request(&site, ["t2m"], &DateRange::year(2020)?, 0.1)?;
//! assert!(req.area.contains(site.latitude(), site.longitude()));
//! # Ok::<(), era5_site::Error>(())
//! ```
//!
//! Notes:
//! - Request areas are not wrapped across the antimeridian; reshaping guards
//!   against the resulting wrong-cell selection with a snapping distance.
//! - Missing archive values stay missing (`None`), they are never zeroed.

mod client;
mod dataset;
mod date;
mod error;
mod grid;
mod request;
mod reshape;
mod site;
mod table;
mod transport;
mod units;
mod variable;

pub use crate::client::{Client, ClientOptions};
pub use crate::dataset::{Accumulation, Dataset};
pub use crate::date::{ArchiveDates, DateRange, parse_date_like};
pub use crate::error::{Error, Result};
pub use crate::grid::{GridVariable, GriddedDataset};
pub use crate::request::{BoundingBox, OutputFormat, RequestParameters, build_request, build_request_for};
pub use crate::reshape::{DEFAULT_MAX_SNAP_DISTANCE_KM, GridCell, Reshaper, reshape};
pub use crate::site::Site;
pub use crate::table::{FlatRecord, FlatTable, TIME_COLUMN};
pub use crate::transport::{HttpTransport, Transport, TransportOptions};
pub use crate::variable::{Unit, Variable};
