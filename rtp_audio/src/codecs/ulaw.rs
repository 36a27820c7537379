use heapless::Vec;

use crate::codecs::{EncodedPayload, Samples, MAX_PAYLOAD};
use crate::error::CodecError;

const ULAW_BIAS: i32 = 0x84;
const ULAW_CLIP: i32 = 32635;

pub fn encode_sample(s: i16) -> u8 {
    let clamped = s.clamp(-ULAW_CLIP as i16, ULAW_CLIP as i16);
    let sign = ((clamped >> 8) & 0x80) as u8;

    let magnitude = if clamped < 0 {
        (!clamped as i32) + ULAW_BIAS
    } else {
        (clamped as i32) + ULAW_BIAS
    };

    let mut exponent: u8 = 0;
    let mut tmp = magnitude >> 7;
    while tmp > 1 && exponent < 7 {
        tmp >>= 1;
        exponent += 1;
    }

    let mantissa = ((magnitude >> (exponent + 3)) & 0x0F) as u8;
    !(sign | (exponent << 4) | mantissa)
}

pub const fn decode_sample(b: u8) -> i16 {
    let byte = !b;
    let sign = (byte & 0x80) != 0;
    let exponent = (byte >> 4) & 0x07;
    let mantissa = byte & 0x0F;

    let mut magnitude = ((mantissa as i32) << 3) + ULAW_BIAS;
    magnitude <<= exponent as i32;
    magnitude -= ULAW_BIAS;

    (if sign { -magnitude } else { magnitude }) as i16
}

pub fn encode_ulaw(samples: &[i16]) -> Result<EncodedPayload, CodecError> {
    if samples.len() > MAX_PAYLOAD {
        return Err(CodecError::PayloadTooLarge(samples.len()));
    }

    let mut out: EncodedPayload = Vec::new();
    for &s in samples {
        out.push(encode_sample(s))
            .map_err(|_| CodecError::PayloadTooLarge(samples.len()))?;
    }
    Ok(out)
}

pub fn decode_ulaw(bytes: &[u8]) -> Result<Samples, CodecError> {
    if bytes.len() > MAX_PAYLOAD {
        return Err(CodecError::PayloadTooLarge(bytes.len()));
    }

    let mut out: Samples = Vec::new();
    for &b in bytes {
        #[cfg(feature = "table_decode")]
        let sample = ULAW_DECODE_TABLE[b as usize];
        #[cfg(not(feature = "table_decode"))]
        let sample = decode_sample(b);

        out.push(sample)
            .map_err(|_| CodecError::PayloadTooLarge(bytes.len()))?;
    }
    Ok(out)
}

#[cfg(feature = "table_decode")]
const ULAW_DECODE_TABLE: [i16; 256] = {
    let mut t = [0i16; 256];
    let mut i = 0;
    while i < 256 {
        t[i] = decode_sample(i as u8);
        i += 1;
    }
    t
};
