// ABOUTME: Runtime connection errors with SNAFU context selectors.
// ABOUTME: Covers endpoint detection, client construction, and API negotiation.

use snafu::Snafu;

use super::detection::DetectionError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum RuntimeError {
    #[snafu(display("runtime detection failed: {source}"), context(false))]
    Detection { source: DetectionError },

    #[snafu(display("connecting to {endpoint}: {source}"))]
    Connection {
        endpoint: String,
        source: bollard::errors::Error,
    },

    #[snafu(display("negotiating API version with {endpoint}: {source}"))]
    Negotiation {
        endpoint: String,
        source: bollard::errors::Error,
    },
}
