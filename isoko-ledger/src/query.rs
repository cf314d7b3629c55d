use uuid::Uuid;

/// Filter describing which records to load for a business.
///
/// An item filter narrows items, purchases and sales to that item and keeps
/// only the grocery payments referencing those purchases and sales. Contacts,
/// vehicles, contracts and rental payments are always returned in full.
#[derive(Clone, Debug)]
pub struct RecordQuery {
    pub business_id: Uuid,
    pub item_id: Option<Uuid>,
}

impl RecordQuery {
    pub fn for_business(business_id: Uuid) -> Self {
        Self {
            business_id,
            item_id: None,
        }
    }

    pub fn with_item(mut self, item_id: Uuid) -> Self {
        self.item_id = Some(item_id);
        self
    }

    pub fn includes_item(&self, item_id: Uuid) -> bool {
        self.item_id.map_or(true, |id| id == item_id)
    }
}
