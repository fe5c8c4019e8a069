//! Turns one applied `Event` into the concrete persistence mutations it
//! implies. Shared by every `Persistence` implementation so the mutation
//! logic isn't duplicated per backend.

use smartdrive_types::{ChunkRecord, Event, FileRecord};

pub struct EventEffects {
    pub chunk_records: Vec<ChunkRecord>,
    pub file_insert: Option<FileRecord>,
    pub file_delete: Option<String>,
    /// `chunk_uuid`s to schedule a pending audit for (Event::Validation only).
    pub schedule_validation_for: Vec<String>,
}

pub fn effects_for(event: &Event, now_ms: i64) -> EventEffects {
    match event {
        Event::Store(store_event) => {
            let params = &store_event.event_params;
            let chunk_records = store_event
                .event_params
                .miners_processes
                .iter()
                .filter(|p| p.succeed)
                .filter_map(|p| {
                    let chunk_uuid = p.chunk_uuid.as_ref()?;
                    let chunk_event = params.chunks.iter().find(|c| &c.uuid == chunk_uuid)?;
                    Some(ChunkRecord {
                        chunk_uuid: chunk_uuid.clone(),
                        file_uuid: params.file_uuid.clone(),
                        chunk_index: chunk_event.chunk_index,
                        miner_address: p.miner_address.clone(),
                        sub_chunk_start: chunk_event.sub_chunk_start,
                        sub_chunk_end: chunk_event.sub_chunk_end,
                        sub_chunk_encoded: chunk_event.sub_chunk_encoded.clone(),
                    })
                })
                .collect();

            let file_insert = Some(FileRecord {
                file_uuid: params.file_uuid.clone(),
                owner_address: store_event.user_address.clone(),
                created_at_ms: params.created_at.unwrap_or(now_ms),
                expiration_ms: params.expiration_ms,
            });

            EventEffects {
                chunk_records,
                file_insert,
                file_delete: None,
                schedule_validation_for: Vec::new(),
            }
        }
        Event::Remove(remove_event) => EventEffects {
            chunk_records: Vec::new(),
            file_insert: None,
            file_delete: Some(remove_event.event_params.file_uuid.clone()),
            schedule_validation_for: Vec::new(),
        },
        Event::Retrieve(_) => EventEffects {
            chunk_records: Vec::new(),
            file_insert: None,
            file_delete: None,
            schedule_validation_for: Vec::new(),
        },
        Event::Validation(validate_event) => EventEffects {
            chunk_records: Vec::new(),
            file_insert: None,
            file_delete: None,
            schedule_validation_for: validate_event
                .event_params
                .miners_processes
                .iter()
                .filter(|p| p.succeed)
                .filter_map(|p| p.chunk_uuid.clone())
                .collect(),
        },
    }
}
