/*
Copyright (c) 2021 VMware, Inc.
SPDX-License-Identifier: MIT
Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:
The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.
THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/


//! The P4Runtime device state machine, independent of the RPC transport.
//!
//! [`Device`] holds the pushed pipeline config, the master arbitration state, and a read-back
//! cache of the wire entries that were written.  Each Write update is translated, applied to the
//! match-action engine and recorded in the cache while the device lock is held, so other RPCs
//! never see the engine and the cache disagree.  The packet path only takes per-table locks.

use itertools::Itertools;

use match_action::{Pipeline, TableError};

use p4ext::Switch;

use proto::p4runtime::{
    Entity, Entity_oneof_entity, FieldMatch, ForwardingPipelineConfig, MasterArbitrationUpdate, PacketIn, ReadRequest,
    ReadResponse, SetForwardingPipelineConfigRequest, SetForwardingPipelineConfigRequest_Action,
    StreamMessageRequest, StreamMessageRequest_oneof_update, StreamMessageResponse, TableEntry, Uint128, Update,
    Update_Type, WriteRequest,
};
use proto::status::Status;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use thiserror::Error;

use tracing::{debug, info, warn};

use crate::directory::SymbolDirectory;
use crate::translate::{translate, translate_key, TranslateError};

/// P4Runtime API version implemented by the device.
pub const P4RUNTIME_VERSION: &str = "1.3.0";

/// Failures reported to the controller.  Each variant is a gRPC status code.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("{0}")]
    FailedPrecondition(String),

    #[error("{0}")]
    ResourceExhausted(String),
}

impl ServiceError {
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidArgument(m)
            | Self::NotFound(m)
            | Self::AlreadyExists(m)
            | Self::FailedPrecondition(m)
            | Self::ResourceExhausted(m) => m,
        }
    }

    fn map_message<F: FnOnce(&str) -> String>(self, f: F) -> Self {
        match self {
            Self::InvalidArgument(m) => Self::InvalidArgument(f(&m)),
            Self::NotFound(m) => Self::NotFound(f(&m)),
            Self::AlreadyExists(m) => Self::AlreadyExists(f(&m)),
            Self::FailedPrecondition(m) => Self::FailedPrecondition(f(&m)),
            Self::ResourceExhausted(m) => Self::ResourceExhausted(f(&m)),
        }
    }
}

impl From<TranslateError> for ServiceError {
    fn from(e: TranslateError) -> Self {
        ServiceError::InvalidArgument(e.to_string())
    }
}

/// An election id as a `(high, low)` pair, which orders lexicographically.
pub type ElectionId = (u64, u64);

fn election_id(id: &Uint128) -> ElectionId {
    (id.high, id.low)
}

/// Match fields sorted by field id, so that entries compare equal regardless of the order in which
/// the controller listed their fields.
fn normalized_matches(entry: &TableEntry) -> Vec<&FieldMatch> {
    entry.get_field_match().iter().sorted_by_key(|m| m.field_id).collect()
}

fn same_match(a: &TableEntry, b: &TableEntry) -> bool {
    normalized_matches(a) == normalized_matches(b)
}

/// A copy of `entry` with its match fields sorted by field id.  The translator consumes match
/// fields by position, and field ids number the key fields from 1 in table order.
fn sorted_by_field_id(entry: &TableEntry) -> TableEntry {
    let mut sorted = entry.clone();
    sorted.set_field_match(normalized_matches(entry).into_iter().cloned().collect());
    sorted
}

struct State {
    directory: SymbolDirectory,
    config: Option<ForwardingPipelineConfig>,
    master: Option<ElectionId>,

    /// Wire entries by table id, in write order.
    cache: BTreeMap<u32, Vec<TableEntry>>,
}

impl State {
    fn write_update(&mut self, update: &Update) -> Result<(), ServiceError> {
        let entry = match &update.get_entity().entity {
            Some(Entity_oneof_entity::table_entry(te)) => te,
            _ => return Err(ServiceError::InvalidArgument("only table entries can be written".into())),
        };
        match update.get_field_type() {
            Update_Type::INSERT => self.insert(entry),
            Update_Type::MODIFY => self.modify(entry),
            Update_Type::DELETE => self.delete(entry),
            Update_Type::UNSPECIFIED => Err(ServiceError::InvalidArgument("unspecified update type".into())),
        }
    }

    fn table(&self, name: &str) -> Result<&Arc<match_action::Table>, ServiceError> {
        self.directory
            .pipeline()
            .table(name)
            .map_err(|e| ServiceError::InvalidArgument(e.to_string()))
    }

    fn insert(&mut self, entry: &TableEntry) -> Result<(), ServiceError> {
        let request = translate(&sorted_by_field_id(entry), &self.directory)?;
        let table = self.table(&request.table)?;
        let max_entries = self
            .directory
            .rules(request.table_id)
            .and_then(|r| r.max_entries);
        if let Some(max) = max_entries {
            if table.len() as u64 >= max {
                return Err(ServiceError::ResourceExhausted(format!(
                    "table {} is full ({} entries)",
                    request.table, max
                )));
            }
        }
        table
            .insert(request.entry())
            .map_err(|e| ServiceError::AlreadyExists(e.to_string()))?;
        self.cache.entry(request.table_id).or_default().push(entry.clone());
        Ok(())
    }

    fn modify(&mut self, entry: &TableEntry) -> Result<(), ServiceError> {
        let request = translate(&sorted_by_field_id(entry), &self.directory)?;
        if !self.table(&request.table)?.modify(request.entry()) {
            info!("{}: modify target not found, table unchanged", request.table);
        }

        let cached = self.cache.entry(request.table_id).or_default();
        match cached.iter_mut().find(|e| same_match(e, entry)) {
            Some(e) => *e = entry.clone(),
            None => {
                info!("{}: modify target not in read-back cache, adding it", request.table);
                cached.push(entry.clone());
            }
        }
        Ok(())
    }

    fn delete(&mut self, entry: &TableEntry) -> Result<(), ServiceError> {
        let key = translate_key(&sorted_by_field_id(entry), &self.directory)?;
        match self.table(&key.table)?.delete(&key.values) {
            Ok(_) => (),
            Err(e @ TableError::NotFound { .. }) => info!("{}", e),
            Err(e) => return Err(ServiceError::InvalidArgument(e.to_string())),
        }

        let cached = self.cache.entry(key.table_id).or_default();
        match cached.iter().position(|e| same_match(e, entry)) {
            Some(index) => {
                cached.remove(index);
            }
            None => info!("{}: delete target not in read-back cache", key.table),
        }
        Ok(())
    }

    /// Stored entries that `requested` selects.  Table id 0 selects every table, and no match
    /// fields select every entry.
    fn read_table_entries(&self, requested: &TableEntry) -> Vec<Entity> {
        let table_ids: Vec<u32> = if requested.table_id == 0 {
            self.cache.keys().copied().collect()
        } else if self.directory.table_name(requested.table_id).is_none() {
            info!("Read: unknown table id {:#x}", requested.table_id);
            return Vec::new();
        } else {
            vec![requested.table_id]
        };

        let wildcard = requested.get_field_match().is_empty();
        let entities: Vec<Entity> = table_ids
            .iter()
            .filter_map(|id| self.cache.get(id))
            .flatten()
            .filter(|stored| wildcard || same_match(stored, requested))
            .map(|stored| {
                let mut entity = Entity::new();
                entity.set_table_entry(stored.clone());
                entity
            })
            .collect();
        if entities.is_empty() {
            info!("Read: no matching entry in table {:#x}", requested.table_id);
        }
        entities
    }
}

/// The software P4Runtime device: the match-action pipeline plus control plane state.
pub struct Device {
    pipeline: Arc<Pipeline>,
    state: Mutex<State>,
}

impl Device {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        let state = State {
            directory: SymbolDirectory::new(pipeline.clone()),
            config: None,
            master: None,
            cache: BTreeMap::new(),
        };
        Device { pipeline, state: Mutex::new(state) }
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    pub fn set_pipeline_config(&self, req: &SetForwardingPipelineConfigRequest) -> Result<(), ServiceError> {
        use SetForwardingPipelineConfigRequest_Action::*;
        let action = req.get_action();
        if !matches!(action, VERIFY | VERIFY_AND_COMMIT | COMMIT) {
            warn!("unsupported pipeline config action {:?}", action);
            return Err(ServiceError::InvalidArgument(format!("unsupported action {:?}", action)));
        }
        if !req.has_config() {
            return Err(ServiceError::InvalidArgument("missing forwarding pipeline config".into()));
        }

        let config = req.get_config();
        let switch: Switch = config.get_p4info().into();
        let mut state = self.state.lock().unwrap();
        state.directory.load(&switch);
        state.config = Some(config.clone());
        info!("pipeline config set ({:?}, {} tables)", action, switch.tables.len());
        Ok(())
    }

    pub fn get_pipeline_config(&self) -> Result<ForwardingPipelineConfig, ServiceError> {
        self.state
            .lock()
            .unwrap()
            .config
            .clone()
            .ok_or_else(|| ServiceError::NotFound("pipeline config not set".into()))
    }

    /// Applies the updates in order.  The first failing update ends the Write; earlier updates
    /// stay applied.
    pub fn write(&self, req: &WriteRequest) -> Result<(), ServiceError> {
        let mut state = self.state.lock().unwrap();
        for (index, update) in req.get_updates().iter().enumerate() {
            if let Err(e) = state.write_update(update) {
                warn!("error processing update [{}]: {}", index, e);
                return Err(e.map_message(|m| format!("error processing update [{}]: {}", index, m)));
            }
        }
        Ok(())
    }

    /// Answers a Read with one response per stored entry that a requested entity selects.
    pub fn read(&self, req: &ReadRequest) -> Result<Vec<ReadResponse>, ServiceError> {
        let state = self.state.lock().unwrap();
        if state.config.is_none() {
            return Err(ServiceError::FailedPrecondition("pipeline config not set".into()));
        }

        let mut responses = Vec::new();
        for entity in req.get_entities() {
            match &entity.entity {
                Some(Entity_oneof_entity::table_entry(te)) => {
                    for e in state.read_table_entries(te) {
                        let mut response = ReadResponse::new();
                        response.mut_entities().push(e);
                        responses.push(response);
                    }
                }
                _ => debug!("Read: ignoring non-table entity"),
            }
        }
        Ok(responses)
    }

    /// Handles one StreamChannel message and returns the reply to send, if any.
    ///
    /// The arbitration reply carries the requester's low election id with a zero high id,
    /// whether or not the requester became master.
    pub fn stream_message(&self, msg: &StreamMessageRequest) -> Option<StreamMessageResponse> {
        match &msg.update {
            Some(StreamMessageRequest_oneof_update::arbitration(arbitration)) => {
                let requested = election_id(arbitration.get_election_id());
                {
                    let mut state = self.state.lock().unwrap();
                    if state.master.map_or(true, |master| requested > master) {
                        info!("new master with election id {:?}", requested);
                        state.master = Some(requested);
                    }
                }

                let mut id = Uint128::new();
                id.set_low(requested.1);
                let mut status = Status::new();
                status.set_code(0);
                let mut ack = MasterArbitrationUpdate::new();
                ack.set_election_id(id);
                ack.set_status(status);

                let mut reply = StreamMessageResponse::new();
                reply.set_arbitration(ack);
                Some(reply)
            }
            Some(StreamMessageRequest_oneof_update::packet(packet)) => {
                let mut packet_in = PacketIn::new();
                packet_in.set_payload(packet.get_payload().to_vec());
                let mut reply = StreamMessageResponse::new();
                reply.set_packet(packet_in);
                Some(reply)
            }
            _ => {
                debug!("StreamChannel: ignoring message");
                None
            }
        }
    }

    pub fn master_election_id(&self) -> Option<ElectionId> {
        self.state.lock().unwrap().master
    }

    pub fn capabilities(&self) -> &'static str {
        P4RUNTIME_VERSION
    }
}
