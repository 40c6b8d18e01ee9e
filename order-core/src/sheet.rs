use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::model::{Part, PreviewHandle};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SheetRow {
    // 1-based, display order
    pub index: usize,
    pub preview: PreviewHandle,
    pub color: String,
    pub description: String,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub price: u64,
}

impl SheetRow {
    pub fn is_complete(&self) -> bool {
        !self.color.trim().is_empty() && !self.name.trim().is_empty()
    }
}

/// Finished order handed to the document collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderSheet {
    pub customer: String,
    pub rows: Vec<SheetRow>,
    pub total: u64,
}

/// Readiness gate: at least one part, and every part has color and name.
pub fn check_ready<'a>(parts: impl IntoIterator<Item = &'a Part>) -> Result<(), ValidationError> {
    let mut seen = 0usize;
    let mut rows = Vec::new();
    for (i, p) in parts.into_iter().enumerate() {
        seen += 1;
        if !p.is_complete() {
            rows.push(i + 1);
        }
    }
    if seen == 0 {
        return Err(ValidationError::EmptySession);
    }
    if !rows.is_empty() {
        return Err(ValidationError::Incomplete { rows });
    }
    Ok(())
}

impl OrderSheet {
    /// Same gate as [`check_ready`], over rows that may have been built or
    /// deserialized outside a session.
    pub fn check_rows(&self) -> Result<(), ValidationError> {
        if self.rows.is_empty() {
            return Err(ValidationError::EmptySession);
        }
        let rows: Vec<usize> = self
            .rows
            .iter()
            .filter(|r| !r.is_complete())
            .map(|r| r.index)
            .collect();
        if rows.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::Incomplete { rows })
        }
    }

    /// Build the sheet, refusing unless every part is ready.
    pub fn build<'a, I>(customer: &str, parts: I, total: u64) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = &'a Part>,
        I::IntoIter: Clone,
    {
        let parts = parts.into_iter();
        check_ready(parts.clone())?;
        let rows = parts
            .enumerate()
            .map(|(i, p)| SheetRow {
                index: i + 1,
                preview: p.preview.clone(),
                color: p.color.clone(),
                description: p.description.clone(),
                name: p.name.clone(),
                width: p.width,
                height: p.height,
                price: p.price,
            })
            .collect();
        Ok(OrderSheet {
            customer: customer.trim().to_string(),
            rows,
            total,
        })
    }
}
