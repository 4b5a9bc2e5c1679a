// Client IP allow-list middleware

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::{collections::HashSet, net::IpAddr, net::SocketAddr, sync::Arc};

use crate::error::ApiError;

/// Set of client addresses admitted by the server, fixed at construction
#[derive(Debug, Clone)]
pub struct IpAllowList {
    allowed: Option<Arc<HashSet<IpAddr>>>,
}

impl IpAllowList {
    pub fn allow_all() -> Self {
        Self { allowed: None }
    }

    pub fn only<I: IntoIterator<Item = IpAddr>>(ips: I) -> Self {
        Self {
            allowed: Some(Arc::new(ips.into_iter().collect())),
        }
    }

    /// `None` in config means no restriction
    pub fn from_config(ips: Option<&[IpAddr]>) -> Self {
        match ips {
            Some(ips) => Self::only(ips.iter().copied()),
            None => Self::allow_all(),
        }
    }

    pub fn is_restricted(&self) -> bool {
        self.allowed.is_some()
    }

    pub fn permits(&self, ip: IpAddr) -> bool {
        match &self.allowed {
            None => true,
            // IPv4-mapped IPv6 peers match their IPv4 entry
            Some(allowed) => allowed.contains(&ip) || allowed.contains(&ip.to_canonical()),
        }
    }
}

/// Reject requests from peers outside the allow-list. A restricted list also
/// rejects requests whose peer address is unknown.
pub async fn ip_filter(
    State(allow_list): State<IpAllowList>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !allow_list.is_restricted() {
        return Ok(next.run(request).await);
    }

    match connect_info {
        Some(ConnectInfo(addr)) if allow_list.permits(addr.ip()) => {
            tracing::debug!("Client IP: {}", addr.ip());
            Ok(next.run(request).await)
        }
        Some(ConnectInfo(addr)) => Err(ApiError::Forbidden(format!(
            "Access denied: IP {} not allowed",
            addr.ip()
        ))),
        None => Err(ApiError::Forbidden(
            "Access denied: client address unknown".to_string(),
        )),
    }
}
