//! Stream deduplication.
//!
//! Several sources report the same stream. Records sharing a resolved id
//! collapse to the one with the most populated fields; the first-seen record
//! wins ties. Records are never merged field by field.

use std::collections::HashMap;

use moveflow_types::RawRecord;

use crate::resolver::{resolve_string, FieldSpec};

/// Collapse records sharing a stream id, keeping first-seen group order.
///
/// Records without a resolvable id are kept as separate entries.
pub fn dedup_records(records: Vec<RawRecord>) -> Vec<RawRecord> {
    let mut slots: Vec<RawRecord> = Vec::with_capacity(records.len());
    let mut by_id: HashMap<String, usize> = HashMap::new();

    for record in records {
        let Some(id) = resolve_string(&record.fields, &FieldSpec::ID) else {
            slots.push(record);
            continue;
        };

        match by_id.get(&id) {
            Some(&index) => {
                if record.populated_field_count() > slots[index].populated_field_count() {
                    slots[index] = record;
                }
            }
            None => {
                by_id.insert(id, slots.len());
                slots.push(record);
            }
        }
    }

    slots
}
