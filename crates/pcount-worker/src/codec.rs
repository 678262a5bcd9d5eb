// SPDX-FileCopyrightText: 2026 Pcount Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON wire codec for request and result messages.

use pcount_core::error::PcountError;
use pcount_core::types::{CountingRequest, CountingResult};

/// Decodes a raw queue payload into a [`CountingRequest`].
///
/// The payload must be UTF-8 JSON with a string `lectureId` and a `photos`
/// array whose elements carry non-empty string `id` and `url` fields. Extra
/// fields are ignored. An empty `photos` array and an empty `lectureId` are
/// both accepted.
pub fn decode_request(payload: &[u8]) -> Result<CountingRequest, PcountError> {
    let request: CountingRequest =
        serde_json::from_slice(payload).map_err(|e| PcountError::Decode {
            message: e.to_string(),
        })?;

    for (i, photo) in request.photos.iter().enumerate() {
        if photo.id.is_empty() {
            return Err(PcountError::Decode {
                message: format!("photos[{i}].id must not be empty"),
            });
        }
        if photo.url.is_empty() {
            return Err(PcountError::Decode {
                message: format!("photos[{i}].url must not be empty"),
            });
        }
    }

    Ok(request)
}

/// Encodes a [`CountingResult`] as the outbound JSON body.
pub fn encode_result(result: &CountingResult) -> Result<Vec<u8>, PcountError> {
    serde_json::to_vec(result)
        .map_err(|e| PcountError::Internal(format!("failed to encode counting result: {e}")))
}
