use crate::bits::{first_bit, popcount};
use crate::format::PixelFormatDescriptor;
use crate::source::{Channels, OPAQUE};

/// Placement of one 8-bit channel inside a packed destination value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ChannelField {
    mask: u32,
    shift: u32,
    /// `8 - popcount(mask)`; negative when the field is wider than 8 bits.
    discard: i32,
}

impl ChannelField {
    pub(crate) const fn from_mask(mask: u32) -> Self {
        Self {
            mask,
            shift: first_bit(mask),
            discard: 8 - popcount(mask) as i32,
        }
    }

    #[inline(always)]
    pub(crate) const fn is_present(&self) -> bool {
        self.mask != 0
    }

    /// Narrow or widen an 8-bit value into this field. Widening is a plain
    /// left shift, so the low bits of a wide field stay zero.
    #[inline(always)]
    pub(crate) fn pack(&self, value: u8) -> u32 {
        if !self.is_present() {
            return 0;
        }
        let value = value as u32;
        let scaled = if self.discard >= 0 {
            value >> self.discard
        } else {
            value << (-self.discard)
        };
        (scaled << self.shift) & self.mask
    }

    /// Inverse of [`pack`](Self::pack), using the same shift rule.
    #[inline(always)]
    pub(crate) fn unpack(&self, packed: u32) -> u8 {
        if !self.is_present() {
            return 0;
        }
        let raw = (packed & self.mask) >> self.shift;
        let scaled = if self.discard >= 0 {
            raw << self.discard
        } else {
            raw >> (-self.discard)
        };
        scaled as u8
    }
}

/// Per-call channel placement for a destination layout, computed once and
/// reused for every pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ChannelPlan {
    fields: [ChannelField; 4],
}

impl ChannelPlan {
    pub(crate) const fn for_descriptor(descriptor: &PixelFormatDescriptor) -> Self {
        Self {
            fields: [
                ChannelField::from_mask(descriptor.red_mask),
                ChannelField::from_mask(descriptor.green_mask),
                ChannelField::from_mask(descriptor.blue_mask),
                ChannelField::from_mask(descriptor.alpha_mask),
            ],
        }
    }

    #[inline(always)]
    pub(crate) fn pack(&self, [r, g, b, a]: Channels) -> u32 {
        self.fields[0].pack(r)
            | self.fields[1].pack(g)
            | self.fields[2].pack(b)
            | self.fields[3].pack(a)
    }

    /// Absent color channels read back as zero, absent alpha as opaque.
    #[inline(always)]
    pub(crate) fn unpack(&self, packed: u32) -> Channels {
        let [r, g, b, a] = self.fields;
        let alpha = if a.is_present() {
            a.unpack(packed)
        } else {
            OPAQUE
        };
        [r.unpack(packed), g.unpack(packed), b.unpack(packed), alpha]
    }
}

/// Write the low `bytes.len()` bytes of `packed`, least significant first.
#[inline(always)]
pub(crate) fn store_packed(bytes: &mut [u8], packed: u32) {
    let le = packed.to_le_bytes();
    let n = bytes.len();
    bytes.copy_from_slice(&le[..n]);
}

#[inline(always)]
pub(crate) fn load_packed(bytes: &[u8]) -> u32 {
    let mut le = [0u8; 4];
    le[..bytes.len()].copy_from_slice(bytes);
    u32::from_le_bytes(le)
}
