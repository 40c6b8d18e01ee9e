use indexmap::{IndexMap, IndexSet};
use tracing::{debug, info, warn};

use crate::analysis::{check_geometry, parse_analysis};
use crate::error::{LookupError, OrderError, Result};
use crate::lookup::{PriceRequest, PricingLookup, settle_price};
use crate::merge::merge_parts;
use crate::model::{EditableField, GroupId, Part, PartId, RawPart, round_mm};
use crate::preview::{DataUrlDecoder, PreviewDecoder};
use crate::sheet::{OrderSheet, check_ready};
use crate::submission::{SourceFile, SubmissionPackage};

// Every transition commits completely or leaves the session as it was.
pub struct OrderSession<L, D = DataUrlDecoder> {
    lookup: L,
    decoder: D,
    parts: IndexMap<PartId, Part>,
    selected: IndexSet<PartId>,
    total_price: u64,
    epoch: u64,
}

impl<L: PricingLookup> OrderSession<L> {
    pub fn new(lookup: L) -> Self {
        Self::with_decoder(lookup, DataUrlDecoder)
    }
}

impl<L: PricingLookup, D: PreviewDecoder> OrderSession<L, D> {
    pub fn with_decoder(lookup: L, decoder: D) -> Self {
        OrderSession {
            lookup,
            decoder,
            parts: IndexMap::new(),
            selected: IndexSet::new(),
            total_price: 0,
            epoch: 0,
        }
    }

    /// Replace the session content with freshly priced analyzer output.
    ///
    /// Prices are looked up one part at a time. Nothing is committed until
    /// every lookup has succeeded.
    pub async fn ingest(&mut self, raw: Vec<RawPart>) -> Result<()> {
        let (parts, total) = match self.price_batch(raw).await {
            Ok(batch) => batch,
            Err(e) => {
                warn!(error = %e, "ingest rejected, session unchanged");
                return Err(e);
            }
        };
        self.parts = parts;
        self.selected.clear();
        self.total_price = total;
        self.epoch += 1;
        info!(
            parts = self.parts.len(),
            total = self.total_price,
            epoch = self.epoch,
            "ingest committed"
        );
        Ok(())
    }

    /// Parse an analyzer response body, then [`ingest`](Self::ingest) it.
    pub async fn ingest_analysis(&mut self, body: &str) -> Result<()> {
        let raw = parse_analysis(body).inspect_err(|e| warn!(error = %e, "analysis rejected"))?;
        self.ingest(raw).await
    }

    async fn price_batch(&self, raw: Vec<RawPart>) -> Result<(IndexMap<PartId, Part>, u64)> {
        for (index, r) in raw.iter().enumerate() {
            check_geometry(index, r)?;
        }
        let mut parts = IndexMap::with_capacity(raw.len());
        let mut total = 0u64;
        for r in raw {
            let width = round_mm(r.width);
            let height = round_mm(r.height);
            let response = self
                .lookup
                .lookup(&PriceRequest::single(width, height))
                .await?;
            let price = settle_price(response)?;
            let part = Part {
                id: PartId::new(),
                group_id: None,
                width,
                height,
                bounds: r.bounds(),
                price,
                color: String::new(),
                name: String::new(),
                description: String::new(),
                preview: r.preview,
                preview_global: r.preview_global,
                parts: Vec::new(),
            };
            debug!(part = %part.id, width, height, price, "priced part");
            total = add_price(total, price)?;
            parts.insert(part.id, part);
        }
        Ok((parts, total))
    }

    /// Flip whether `id` is marked for merging. Returns the new membership.
    pub fn toggle_select(&mut self, id: PartId) -> Result<bool> {
        if !self.parts.contains_key(&id) {
            return Err(OrderError::UnknownPart(id));
        }
        if self.selected.shift_remove(&id) {
            Ok(false)
        } else {
            self.selected.insert(id);
            Ok(true)
        }
    }

    /// Edit one metadata field. Price and geometry are never touched.
    pub fn update_field(&mut self, id: PartId, field: EditableField, value: &str) -> Result<()> {
        let part = self.parts.get_mut(&id).ok_or(OrderError::UnknownPart(id))?;
        let slot = match field {
            EditableField::Color => &mut part.color,
            EditableField::Name => &mut part.name,
            EditableField::Description => &mut part.description,
        };
        value.clone_into(slot);
        Ok(())
    }

    pub fn set_color(&mut self, id: PartId, color: &str) -> Result<()> {
        self.update_field(id, EditableField::Color, color)
    }

    pub fn set_name(&mut self, id: PartId, name: &str) -> Result<()> {
        self.update_field(id, EditableField::Name, name)
    }

    pub fn set_description(&mut self, id: PartId, description: &str) -> Result<()> {
        self.update_field(id, EditableField::Description, description)
    }

    /// Replace the selected parts with one merged, re-priced part.
    ///
    /// With fewer than two parts selected this does nothing and returns
    /// `Ok(None)`. On success the merged part is appended after the remaining
    /// parts and its id is returned.
    pub async fn merge_selected(&mut self) -> Result<Option<PartId>> {
        if self.selected.len() < 2 {
            debug!(selected = self.selected.len(), "merge skipped");
            return Ok(None);
        }
        let merged = match self.build_merged().await {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "merge rejected, session unchanged");
                return Err(e);
            }
        };

        let consumed = merged
            .parts
            .iter()
            .try_fold(0u64, |acc, p| add_price(acc, p.price))?;
        let total = add_price(self.total_price.saturating_sub(consumed), merged.price)?;

        let selected = &self.selected;
        self.parts.retain(|id, _| !selected.contains(id));
        self.total_price = total;
        self.selected.clear();

        let id = merged.id;
        info!(
            part = %id,
            part_count = merged.parts.len(),
            width = merged.width,
            height = merged.height,
            price = merged.price,
            total = self.total_price,
            "merge committed"
        );
        self.parts.insert(id, merged);
        Ok(Some(id))
    }

    async fn build_merged(&self) -> Result<Part> {
        let chosen: Vec<&Part> = self
            .parts
            .values()
            .filter(|p| self.selected.contains(&p.id))
            .collect();
        let geometry = merge_parts(&chosen, &self.decoder).await?;
        let width = round_mm(geometry.width);
        let height = round_mm(geometry.height);
        let request = PriceRequest::merged(width, height, chosen.iter().map(|p| p.size()).collect());
        let price = settle_price(self.lookup.lookup(&request).await?)?;

        let first = chosen[0];
        Ok(Part {
            id: PartId::new(),
            group_id: Some(GroupId::new()),
            width,
            height,
            bounds: geometry.bounds,
            price,
            color: first.color.clone(),
            name: first.name.clone(),
            description: String::new(),
            preview: geometry.preview.clone(),
            preview_global: Some(geometry.preview),
            parts: chosen.into_iter().cloned().collect(),
        })
    }

    /// Drop everything, as when a different drawing is chosen.
    pub fn reset(&mut self) {
        self.parts.clear();
        self.selected.clear();
        self.total_price = 0;
        self.epoch += 1;
    }

    /// Every part has a color and a name, and there is at least one part.
    pub fn is_ready(&self) -> bool {
        check_ready(self.parts.values()).is_ok()
    }

    /// Export view of the order. Refused while the session is not ready.
    pub fn order_sheet(&self, customer: &str) -> Result<OrderSheet> {
        OrderSheet::build(customer, self.parts.values(), self.total_price)
            .inspect_err(|e| warn!(error = %e, "export refused"))
            .map_err(OrderError::from)
    }

    /// Bundle the order for submission. Refused while the session is not ready.
    pub fn submission(
        &self,
        customer: &str,
        original: SourceFile,
        document: Vec<u8>,
    ) -> Result<SubmissionPackage> {
        let sheet = self.order_sheet(customer)?;
        Ok(SubmissionPackage::new(sheet, customer, original, document)?)
    }
}

impl<L, D> OrderSession<L, D> {
    pub fn parts(&self) -> impl ExactSizeIterator<Item = &Part> + Clone {
        self.parts.values()
    }

    pub fn part(&self, id: PartId) -> Option<&Part> {
        self.parts.get(&id)
    }

    pub fn id_at(&self, index: usize) -> Option<PartId> {
        self.parts.get_index(index).map(|(id, _)| *id)
    }

    pub fn selected(&self) -> impl ExactSizeIterator<Item = PartId> + '_ {
        self.selected.iter().copied()
    }

    pub fn is_selected(&self, id: PartId) -> bool {
        self.selected.contains(&id)
    }

    pub fn total_price(&self) -> u64 {
        self.total_price
    }

    /// Total re-summed from the current parts.
    pub fn recomputed_total(&self) -> u64 {
        self.parts
            .values()
            .fold(0u64, |acc, p| acc.saturating_add(p.price))
    }

    /// Bumped on every ingest and reset.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn lookup(&self) -> &L {
        &self.lookup
    }
}

fn add_price(total: u64, price: u64) -> std::result::Result<u64, LookupError> {
    total
        .checked_add(price)
        .ok_or_else(|| LookupError::Malformed(format!("order total overflows adding {price}")))
}
