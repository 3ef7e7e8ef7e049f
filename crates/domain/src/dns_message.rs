//! Small helpers over `hickory_proto` messages shared by every resolver stage.

use hickory_proto::op::{Message, MessageType, ResponseCode};
use hickory_proto::rr::rdata::{A, AAAA};
use hickory_proto::rr::{Name, RData, Record, RecordType};
use std::net::IpAddr;

/// Builds a reply skeleton for `request`: same id, opcode, RD/CD flags and question section.
pub fn reply_to(request: &Message, code: ResponseCode) -> Message {
    let mut reply = Message::new();
    reply
        .set_id(request.id())
        .set_message_type(MessageType::Response)
        .set_op_code(request.op_code())
        .set_recursion_desired(request.recursion_desired())
        .set_recursion_available(true)
        .set_checking_disabled(request.checking_disabled())
        .set_response_code(code);
    reply.add_queries(request.queries().to_vec());
    reply
}

/// Lowercased ASCII form of `name` without the trailing root dot.
pub fn normalize_name(name: &Name) -> String {
    let mut ascii = name.to_ascii().to_ascii_lowercase();
    if ascii.ends_with('.') {
        ascii.pop();
    }
    ascii
}

/// Lowercases a textual name and strips one trailing dot.
pub fn normalize_str(name: &str) -> String {
    let trimmed = name.trim();
    trimmed
        .strip_suffix('.')
        .unwrap_or(trimmed)
        .to_ascii_lowercase()
}

/// `name` itself followed by each parent domain, e.g. `a.b.c`, `b.c`, `c`.
pub fn self_and_parents(name: &str) -> impl Iterator<Item = &str> {
    std::iter::successors(Some(name), |current| {
        current.split_once('.').map(|(_, parent)| parent)
    })
    .filter(|part| !part.is_empty())
}

/// Address record for `ip` when its family fits `qtype`.
pub fn address_record(name: &Name, qtype: RecordType, ip: IpAddr, ttl: u32) -> Option<Record> {
    let rdata = match (qtype, ip) {
        (RecordType::A, IpAddr::V4(v4)) => RData::A(A(v4)),
        (RecordType::AAAA, IpAddr::V6(v6)) => RData::AAAA(AAAA(v6)),
        _ => return None,
    };
    Some(Record::from_rdata(name.clone(), ttl, rdata))
}

/// Reply to `request` answering its first question with every address in `ips` matching the
/// question type. Non-address questions get an empty NOERROR.
pub fn address_reply(request: &Message, ips: &[IpAddr], ttl: u32) -> Message {
    let mut reply = reply_to(request, ResponseCode::NoError);
    reply.set_authoritative(true);
    if let Some(query) = request.queries().first() {
        let answers: Vec<Record> = ips
            .iter()
            .filter_map(|ip| address_record(query.name(), query.query_type(), *ip, ttl))
            .collect();
        reply.insert_answers(answers);
    }
    reply
}
