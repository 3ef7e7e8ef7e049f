use async_trait::async_trait;
use bguard_application::ports::{ResolveContext, Resolver};
use bguard_domain::{DomainError, Request, Response, ResponseType};
use hickory_proto::op::{Edns, Message};
use hickory_proto::rr::rdata::opt::{EdnsCode, EdnsOption};
use std::sync::Arc;

/// EDNS option code of Extended DNS Errors (RFC 8914).
const EDE_OPTION_CODE: u16 = 15;

/// Attaches an Extended DNS Error option describing why the answer was produced.
pub struct EdeResolver {
    enabled: bool,
    next: Arc<dyn Resolver>,
}

impl EdeResolver {
    pub fn new(enabled: bool, next: Arc<dyn Resolver>) -> Self {
        Self { enabled, next }
    }
}

#[async_trait]
impl Resolver for EdeResolver {
    fn name(&self) -> &'static str {
        "ede"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn resolve(
        &self,
        ctx: &ResolveContext,
        request: &Request,
    ) -> Result<Response, DomainError> {
        let mut response = self.next.resolve(ctx, request).await?;

        // OPT goes only to clients that sent one (RFC 6891 §7)
        let client_edns = request.message().extensions().is_some();
        if self.enabled && client_edns && response.rtype != ResponseType::Resolved {
            attach_extended_error(
                &mut response.message,
                response.rtype.to_extended_error_code().as_u16(),
                &response.reason,
            );
        }

        Ok(response)
    }
}

/// Option payload: 2-byte info code followed by UTF-8 extra text.
pub fn attach_extended_error(message: &mut Message, info_code: u16, text: &str) {
    let mut payload = Vec::with_capacity(2 + text.len());
    payload.extend_from_slice(&info_code.to_be_bytes());
    payload.extend_from_slice(text.as_bytes());

    let mut edns = message.extensions().clone().unwrap_or_else(Edns::new);
    edns.options_mut().insert(EdnsOption::Unknown(EDE_OPTION_CODE, payload));
    message.set_edns(edns);
}

/// Reads back the info code and text of an attached Extended DNS Error.
pub fn extended_error(message: &Message) -> Option<(u16, String)> {
    let edns = message.extensions().as_ref()?;
    match edns.option(EdnsCode::from(EDE_OPTION_CODE))? {
        EdnsOption::Unknown(_, payload) if payload.len() >= 2 => {
            let code = u16::from_be_bytes([payload[0], payload[1]]);
            let text = String::from_utf8_lossy(&payload[2..]).into_owned();
            Some((code, text))
        }
        _ => None,
    }
}
