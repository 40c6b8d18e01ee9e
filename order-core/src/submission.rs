use crate::error::ValidationError;
use crate::sheet::OrderSheet;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Everything the submission stage consumes. The engine is done once this
/// exists.
#[derive(Clone, Debug, PartialEq)]
pub struct SubmissionPackage {
    pub customer: String,
    pub sheet: OrderSheet,
    pub original: SourceFile,
    /// Rendered order document (e.g. PDF bytes).
    pub document: Vec<u8>,
}

impl SubmissionPackage {
    pub fn new(
        sheet: OrderSheet,
        customer: &str,
        original: SourceFile,
        document: Vec<u8>,
    ) -> Result<Self, ValidationError> {
        let customer = customer.trim();
        if customer.is_empty() {
            return Err(ValidationError::MissingCustomer);
        }
        if original.bytes.is_empty() {
            return Err(ValidationError::MissingFile);
        }
        sheet.check_rows()?;
        Ok(SubmissionPackage {
            customer: customer.to_string(),
            sheet,
            original,
            document,
        })
    }

    /// `{customer}_{stamp}.zip`
    pub fn archive_name(&self, stamp: &str) -> String {
        format!("{}_{}.zip", self.customer, file_stamp(stamp))
    }

    /// `{customer}_{stamp}.pdf`
    pub fn document_name(&self, stamp: &str) -> String {
        format!("{}_{}.pdf", self.customer, file_stamp(stamp))
    }
}

// colons are not portable in file names
fn file_stamp(stamp: &str) -> String {
    stamp.trim().replace(':', ".")
}
