//! Routing of `(group, device, action)` requests to device groups.
//!
//! The dispatcher never fails: anything that cannot be routed is logged
//! and answered with the uniform fail reply.

use std::collections::HashMap;

use async_trait::async_trait;
use jig_core::action::ActionCode;
use jig_core::error::CoreError;
use jig_core::protocol::{DeviceReply, Request, Response};
use jig_core::types::GroupId;
use tokio::sync::Mutex;

/// One hardware module answering requests for a group id.
#[async_trait]
pub trait DeviceGroup: Send + Sync {
    fn group(&self) -> GroupId;

    /// Populate the module state from live hardware. Called once at boot.
    async fn init(&mut self);

    /// Handle one request. `did` is the raw device id; each group decodes
    /// its own addressing scheme.
    async fn check(&mut self, did: u16, action: ActionCode) -> Result<DeviceReply, CoreError>;
}

#[derive(Default)]
pub struct Dispatcher {
    groups: HashMap<GroupId, Mutex<Box<dyn DeviceGroup>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module. A later registration for the same group replaces
    /// the earlier one.
    pub fn register(&mut self, group: Box<dyn DeviceGroup>) {
        let id = group.group();
        if self.groups.insert(id, Mutex::new(group)).is_some() {
            tracing::warn!(group = %id, "Device group registered twice, replacing");
        }
    }

    pub fn is_registered(&self, group: GroupId) -> bool {
        self.groups.contains_key(&group)
    }

    /// Initialise every registered group in group-id order.
    pub async fn init_all(&self) {
        for id in GroupId::ALL {
            if let Some(group) = self.groups.get(&id) {
                tracing::info!(group = %id, "Initialising device group");
                group.lock().await.init().await;
            }
        }
    }

    /// Route one request and wrap the reply in the response envelope.
    pub async fn check(&self, gid: u8, did: u16, action: char) -> Response {
        let reply = match self.route(gid, did, action).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(gid, did, %action, error = %e, "Request rejected");
                DeviceReply::zero_fail()
            }
        };
        Response::from_reply(gid, did, reply)
    }

    pub async fn handle(&self, request: &Request) -> Response {
        self.check(request.gid, request.did, request.action).await
    }

    async fn route(&self, gid: u8, did: u16, action: char) -> Result<DeviceReply, CoreError> {
        let id = GroupId::try_from(gid)?;
        let action = ActionCode::try_from(action)?;
        let group = self
            .groups
            .get(&id)
            .ok_or(CoreError::GroupUnavailable(id))?;

        group.lock().await.check(did, action).await
    }
}
