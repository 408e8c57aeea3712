//! # Wire Helpers
//!
//! Typed reads and writes over a [`NegotiationConn`]. Both the host session
//! and renter-side test drivers use these.

use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::{decode, encode};

use crate::domain::{NegotiationResponse, SessionError};
use crate::ports::NegotiationConn;

/// Read one object of at most `max_len` encoded bytes.
pub async fn read_object<T, C>(conn: &mut C, max_len: u64) -> Result<T, SessionError>
where
    T: DeserializeOwned,
    C: NegotiationConn + ?Sized,
{
    let frame = conn.read_frame(max_len).await?;
    Ok(decode(&frame, max_len)?)
}

/// Write one object.
pub async fn write_object<T, C>(conn: &mut C, object: &T) -> Result<(), SessionError>
where
    T: Serialize + Sync + ?Sized,
    C: NegotiationConn + ?Sized,
{
    let frame = encode(object)?;
    conn.write_frame(&frame).await?;
    Ok(())
}

/// Read a response. `Reject` becomes [`SessionError::PeerRejected`].
pub async fn read_response<C>(conn: &mut C, max_len: u64) -> Result<NegotiationResponse, SessionError>
where
    C: NegotiationConn + ?Sized,
{
    match read_object(conn, max_len).await? {
        NegotiationResponse::Reject(reason) => Err(SessionError::PeerRejected(reason)),
        response => Ok(response),
    }
}

/// Send acceptance.
pub async fn write_accept<C>(conn: &mut C) -> Result<(), SessionError>
where
    C: NegotiationConn + ?Sized,
{
    write_object(conn, &NegotiationResponse::Accept).await
}

/// Send stop.
pub async fn write_stop<C>(conn: &mut C) -> Result<(), SessionError>
where
    C: NegotiationConn + ?Sized,
{
    write_object(conn, &NegotiationResponse::Stop).await
}

/// Send a rejection carrying `reason`, truncated to fit `max_len` once
/// encoded.
pub async fn write_rejection<C>(conn: &mut C, reason: &str, max_len: u64) -> Result<(), SessionError>
where
    C: NegotiationConn + ?Sized,
{
    // 4-byte variant tag plus 8-byte string length.
    let budget = (max_len as usize).saturating_sub(12);
    let mut end = reason.len().min(budget);
    while !reason.is_char_boundary(end) {
        end -= 1;
    }
    write_object(conn, &NegotiationResponse::Reject(reason[..end].to_string())).await
}
