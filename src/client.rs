use log::info;

use crate::dataset::Dataset;
use crate::date::DateRange;
use crate::error::Result;
use crate::request::{OutputFormat, RequestParameters, build_request_for};
use crate::reshape::{DEFAULT_MAX_SNAP_DISTANCE_KM, Reshaper};
use crate::site::Site;
use crate::table::FlatTable;
use crate::transport::{HttpTransport, Transport, TransportOptions};

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub dataset: Dataset,
    /// Degrees around the site; `None` uses the dataset's grid resolution.
    pub area_buffer: Option<f64>,
    /// Grid file format asked of the archive.
    pub format: OutputFormat,
    pub max_snap_distance_km: f64,
    /// Convert to output units (deg C, W/m^2) before returning.
    pub convert_units: bool,
    /// Drop records the archive returned outside the requested range.
    pub trim_to_range: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            dataset: Dataset::default(),
            area_buffer: None,
            format: OutputFormat::default(),
            max_snap_distance_km: DEFAULT_MAX_SNAP_DISTANCE_KM,
            convert_units: true,
            trim_to_range: true,
        }
    }
}

/// Request -> fetch -> reshape pipeline for one site at a time.
#[derive(Debug, Clone)]
pub struct Client<T> {
    opts: ClientOptions,
    transport: T,
}

impl Client<HttpTransport> {
    pub fn http(opts: ClientOptions, transport: TransportOptions) -> Result<Self> {
        Ok(Self::new(opts, HttpTransport::new(transport)?))
    }
}

impl<T: Transport> Client<T> {
    pub fn new(opts: ClientOptions, transport: T) -> Self {
        Self { opts, transport }
    }

    pub fn options(&self) -> &ClientOptions {
        &self.opts
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn build_request<I, V>(&self, site: &Site, variables: I, range: &DateRange) -> Result<RequestParameters>
    where
        I: IntoIterator<Item = V>,
        V: AsRef<str>,
    {
        let buffer = self
            .opts
            .area_buffer
            .unwrap_or_else(|| self.opts.dataset.grid_resolution());
        Ok(build_request_for(self.opts.dataset, site, variables, range, buffer)?.with_format(self.opts.format))
    }

    /// Fetch `variables` for `site` over `range` as a flat table.
    ///
    /// Any failure is returned as-is; nothing is retried and no partial table
    /// is produced.
    pub fn retrieve_table<I, V>(&self, site: &Site, variables: I, range: &DateRange) -> Result<FlatTable>
    where
        I: IntoIterator<Item = V>,
        V: AsRef<str>,
    {
        let request = self.build_request(site, variables, range)?;
        // Transports may hand back more than was asked for.
        let dataset = self.transport.fetch(&request)?.select(&request.variable)?;

        let mut table = Reshaper::new(self.opts.max_snap_distance_km).reshape(dataset, site)?;
        // Convert before trimming so the first hour in range can still be
        // de-accumulated against the hour before it.
        if self.opts.convert_units {
            table = table.to_output_units(self.opts.dataset.accumulation());
        }
        if self.opts.trim_to_range {
            table = table.within(range);
        }

        info!(
            "retrieved {} record(s) x {} variable(s) for {range}",
            table.len(),
            table.columns().len()
        );
        Ok(table)
    }
}
