/***************************************************************************************************
 * Copyright (c) 2021-2023 Qualcomm Innovation Center, Inc. All rights reserved.
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy of this software
 * and associated documentation files (the “Software”), to deal in the Software without
 * restriction, including without limitation the rights to use, copy, modify, merge, publish,
 * distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the
 * Software is furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all copies or
 * substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING
 * BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
 * NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
 * DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
 **************************************************************************************************/
/***************************************************************************************************
 * Whole-message checksums
 *
 * CRC algorithms over the message body span, with configurable start value and stored byte
 * order. The span runs `[body_start + skip_start, checksum_offset - skip_end)`.
 **************************************************************************************************/
use crc::{Crc, CRC_16_ARC, CRC_16_IBM_SDLC, CRC_32_ISO_HDLC, CRC_8_SMBUS};

use crate::numeric::ByteOrder;

const CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_SMBUS);
const CRC16_ARC: Crc<u16> = Crc::<u16>::new(&CRC_16_ARC);
const CRC16_SDLC: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_SDLC);
const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Checksum algorithms available to checksum fields. Widths are fixed per algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumAlgorithm {
    /// CRC-8/SMBus, poly 0x07.
    Crc8,
    /// CRC-16/ARC (the "IBM" CRC), poly 0x8005 reflected, init 0x0000.
    Crc16Arc,
    /// CRC-16/IBM-SDLC (X.25), poly 0x1021 reflected, init 0xFFFF.
    Crc16IbmSdlc,
    /// CRC-32/ISO-HDLC, the ubiquitous zip/png CRC.
    Crc32,
}

impl ChecksumAlgorithm {
    /// Width of the stored checksum in bytes.
    pub fn width_bytes(self) -> usize {
        match self {
            ChecksumAlgorithm::Crc8 => 1,
            ChecksumAlgorithm::Crc16Arc | ChecksumAlgorithm::Crc16IbmSdlc => 2,
            ChecksumAlgorithm::Crc32 => 4,
        }
    }

    /// Run the algorithm over `data`. A `start` value overrides the algorithm's standard
    /// initial register.
    pub fn compute(self, data: &[u8], start: Option<u64>) -> u64 {
        match self {
            ChecksumAlgorithm::Crc8 => match start {
                None => CRC8.checksum(data) as u64,
                Some(s) => {
                    let mut d = CRC8.digest_with_initial(s as u8);
                    d.update(data);
                    d.finalize() as u64
                }
            },
            ChecksumAlgorithm::Crc16Arc => match start {
                None => CRC16_ARC.checksum(data) as u64,
                Some(s) => {
                    let mut d = CRC16_ARC.digest_with_initial(s as u16);
                    d.update(data);
                    d.finalize() as u64
                }
            },
            ChecksumAlgorithm::Crc16IbmSdlc => match start {
                None => CRC16_SDLC.checksum(data) as u64,
                Some(s) => {
                    let mut d = CRC16_SDLC.digest_with_initial(s as u16);
                    d.update(data);
                    d.finalize() as u64
                }
            },
            ChecksumAlgorithm::Crc32 => match start {
                None => CRC32.checksum(data) as u64,
                Some(s) => {
                    let mut d = CRC32.digest_with_initial(s as u32);
                    d.update(data);
                    d.finalize() as u64
                }
            },
        }
    }
}

/// Declaration of a checksum field: the algorithm, the bytes excluded from the span at either
/// end, the stored byte order and an optional start value.
#[derive(Debug, Clone)]
pub struct ChecksumSpec {
    pub algorithm: ChecksumAlgorithm,
    pub skip_start: u64,
    pub skip_end: u64,
    pub order: ByteOrder,
    pub start: Option<u64>,
}

impl ChecksumSpec {
    /// A spec with no skips, big-endian storage and the algorithm's standard start value.
    pub fn new(algorithm: ChecksumAlgorithm) -> ChecksumSpec {
        ChecksumSpec {
            algorithm,
            skip_start: 0,
            skip_end: 0,
            order: ByteOrder::Big,
            start: None,
        }
    }

    /// Exclude bytes at either end of the body span.
    pub fn with_skips(mut self, skip_start: u64, skip_end: u64) -> ChecksumSpec {
        self.skip_start = skip_start;
        self.skip_end = skip_end;
        self
    }

    /// Byte order of the stored checksum value.
    pub fn with_order(mut self, order: ByteOrder) -> ChecksumSpec {
        self.order = order;
        self
    }

    /// Override the algorithm's initial register value.
    pub fn with_start(mut self, start: u64) -> ChecksumSpec {
        self.start = Some(start);
        self
    }

    /// Resolve the checksummed span `[body_start + skip_start, checksum_offset - skip_end)`.
    /// `None` when the declared skips collapse or invert the span.
    pub fn span_bounds(&self, body_start: usize, checksum_offset: usize) -> Option<(usize, usize)> {
        let lo = body_start.checked_add(self.skip_start as usize)?;
        let hi = checksum_offset.checked_sub(self.skip_end as usize)?;
        if lo > hi {
            None
        } else {
            Some((lo, hi))
        }
    }
}

//*************************************************************************************************
// Unit Tests
//*************************************************************************************************
#[cfg(test)]
mod tests {
    use super::*;

    // standard check values over the ASCII bytes "123456789"
    #[test]
    fn check_values() {
        let data = b"123456789";
        assert_eq!(ChecksumAlgorithm::Crc8.compute(data, None), 0xf4);
        assert_eq!(ChecksumAlgorithm::Crc16Arc.compute(data, None), 0xbb3d);
        assert_eq!(ChecksumAlgorithm::Crc16IbmSdlc.compute(data, None), 0x906e);
        assert_eq!(ChecksumAlgorithm::Crc32.compute(data, None), 0xcbf43926);
    }

    #[test]
    fn explicit_standard_start_matches_default() {
        let data = b"123456789";
        assert_eq!(
            ChecksumAlgorithm::Crc16Arc.compute(data, Some(0)),
            ChecksumAlgorithm::Crc16Arc.compute(data, None)
        );
    }

    #[test]
    fn span_arithmetic() {
        let spec = ChecksumSpec::new(ChecksumAlgorithm::Crc16Arc).with_skips(4, 0);
        assert_eq!(spec.span_bounds(3, 20), Some((7, 20)));
        assert_eq!(spec.span_bounds(3, 2), None);
        let spec = ChecksumSpec::new(ChecksumAlgorithm::Crc16Arc).with_skips(0, 30);
        assert_eq!(spec.span_bounds(0, 20), None);
    }
}
