//! Order composition and pricing for cut-part drawings.
//!
//! An [`OrderSession`] is filled from analyzer output, priced through an
//! injected [`PricingLookup`], edited, and merged until every part has a color
//! and a name. It then yields an [`OrderSheet`] for the document stage and a
//! [`SubmissionPackage`] for delivery.
//!
//! ```ignore
//! use order_core::{LocalPricing, OrderSession};
//!
//! let mut session = OrderSession::new(LocalPricing);
//! session.ingest_analysis(&analyzer_body).await?;
//! let first = session.id_at(0).unwrap();
//! session.set_color(first, "Copper")?;
//! session.set_name(first, "Fox")?;
//! let sheet = session.order_sheet("Atelier")?;
//! ```

pub mod analysis;
pub mod error;
pub mod lookup;
pub mod merge;
pub mod model;
pub mod preview;
pub mod session;
pub mod sheet;
pub mod submission;

pub use analysis::parse_analysis;
pub use error::{AnalysisError, LookupError, MergeError, OrderError, Result, ValidationError};
pub use lookup::{
    LocalPricing, MAX_PART_PRICE, PriceRequest, PriceResponse, PricingLookup, parse_price_response, settle_price,
};
pub use merge::{MERGE_PADDING_MM, MergeLayout, MergedGeometry, Placement, merge_layout, merge_parts};
pub use model::{Bounds, EditableField, GroupId, Part, PartId, PartSize, PreviewHandle, RawPart};
pub use preview::{DataUrlDecoder, DecodeError, PreviewDecoder};
pub use session::OrderSession;
pub use sheet::{OrderSheet, SheetRow};
pub use submission::{SourceFile, SubmissionPackage};
