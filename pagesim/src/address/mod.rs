use core::fmt;

/// Width of a logical address in bits.
pub const ADDRESS_BITS: u32 = 12;

/// Top bits of an address that select the segment.
pub const SEGMENT_BITS: u32 = 2;

const ADDRESS_MASK: u16 = (1 << ADDRESS_BITS) - 1;
const SEGMENT_FIELD_MASK: u16 = (1 << (ADDRESS_BITS - SEGMENT_BITS)) - 1;

/// The four logical regions of the address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Text,
    Data,
    Bss,
    HeapStack,
}

impl Segment {
    pub const ALL: &[Self] = &[Self::Text, Self::Data, Self::Bss, Self::HeapStack];

    /// Position of this segment's descriptor table.
    pub const fn index(&self) -> usize {
        match self {
            Self::Text => 0,
            Self::Data => 1,
            Self::Bss => 2,
            Self::HeapStack => 3,
        }
    }

    /// First logical address of the segment.
    pub const fn base(&self) -> u16 {
        (self.index() as u16) << (ADDRESS_BITS - SEGMENT_BITS)
    }

    /// Builds a segment from the two-bit id field of an address.
    pub const fn from_id(id: u16) -> Self {
        match id & 0b11 {
            0 => Self::Text,
            1 => Self::Data,
            2 => Self::Bss,
            _ => Self::HeapStack,
        }
    }

    /// Whether pages of this segment may be copied to the swap store.
    pub const fn swappable(&self) -> bool {
        !matches!(self, Self::Text)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Text => "text",
            Self::Data => "data",
            Self::Bss => "bss",
            Self::HeapStack => "heap/stack",
        };

        write!(f, "{s}")
    }
}

/// Sizes of the four segments plus the page size, fixed at construction.
///
/// The page size must be a power of two that evenly divides the physical
/// memory size and every segment size. This is a precondition of the whole
/// simulator and is not checked at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentLayout {
    pub text_size: usize,
    pub data_size: usize,
    pub bss_size: usize,
    pub heap_stack_size: usize,
    pub page_size: usize,
}

impl SegmentLayout {
    /// Configured byte size of one segment.
    pub const fn size_of(&self, segment: Segment) -> usize {
        match segment {
            Segment::Text => self.text_size,
            Segment::Data => self.data_size,
            Segment::Bss => self.bss_size,
            Segment::HeapStack => self.heap_stack_size,
        }
    }

    /// Number of pages backing one segment.
    pub const fn pages_in(&self, segment: Segment) -> usize {
        self.size_of(segment) / self.page_size
    }

    /// Number of pages across the segments eligible for swap.
    pub const fn swappable_pages(&self) -> usize {
        self.pages_in(Segment::Data)
            + self.pages_in(Segment::Bss)
            + self.pages_in(Segment::HeapStack)
    }

    fn offset_bits(&self) -> u32 {
        self.page_size.trailing_zeros()
    }

    /// Whether the raw address falls inside the segment's configured range.
    ///
    /// The upper bound is inclusive for every segment except heap/stack; the
    /// end-of-segment address itself passes this check for text, data, and
    /// bss even though no page backs it.
    pub fn contains(&self, segment: Segment, address: u16) -> bool {
        let address = address as usize;
        let base = segment.base() as usize;

        match segment {
            Segment::HeapStack => address >= base && address < base + self.heap_stack_size,
            _ => address >= base && address <= base + self.size_of(segment),
        }
    }

    /// Splits an address into segment, page number, and page offset,
    /// rejecting addresses outside the configured segment ranges.
    pub fn decode(&self, address: u16) -> Option<VirtualAddress> {
        let truncated = address & ADDRESS_MASK;
        let segment = Segment::from_id(truncated >> (ADDRESS_BITS - SEGMENT_BITS));

        if !self.contains(segment, address) {
            return None;
        }

        let page = ((truncated & SEGMENT_FIELD_MASK) >> self.offset_bits()) as usize;
        let offset = (truncated as usize) & (self.page_size - 1);

        // The inclusive bounds above admit the end-of-segment address, which
        // names a page one past the table. No descriptor exists for it.
        if page >= self.pages_in(segment) {
            return None;
        }

        Some(VirtualAddress {
            raw: address,
            segment,
            page,
            offset,
        })
    }
}

/// A decoded logical address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualAddress {
    pub raw: u16,
    pub segment: Segment,
    pub page: usize,
    pub offset: usize,
}

impl fmt::Display for VirtualAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:#05x} ({}, page {}, offset {})",
            self.raw, self.segment, self.page, self.offset
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAYOUT: SegmentLayout = SegmentLayout {
        text_size: 80,
        data_size: 40,
        bss_size: 40,
        heap_stack_size: 40,
        page_size: 8,
    };

    #[test]
    fn segment_bases() {
        assert_eq!(Segment::Text.base(), 0);
        assert_eq!(Segment::Data.base(), 1024);
        assert_eq!(Segment::Bss.base(), 2048);
        assert_eq!(Segment::HeapStack.base(), 3072);
    }

    #[test]
    fn segment_from_id_covers_all_values() {
        assert_eq!(Segment::from_id(0), Segment::Text);
        assert_eq!(Segment::from_id(1), Segment::Data);
        assert_eq!(Segment::from_id(2), Segment::Bss);
        assert_eq!(Segment::from_id(3), Segment::HeapStack);
    }

    #[test]
    fn decode_splits_fields() {
        // Data base + page 2 + offset 5
        let va = LAYOUT.decode(1024 + 2 * 8 + 5).unwrap();

        assert_eq!(va.segment, Segment::Data);
        assert_eq!(va.page, 2);
        assert_eq!(va.offset, 5);
    }

    #[test]
    fn decode_first_byte_of_each_segment() {
        for &segment in Segment::ALL {
            let va = LAYOUT.decode(segment.base()).unwrap();
            assert_eq!(va.segment, segment);
            assert_eq!(va.page, 0);
            assert_eq!(va.offset, 0);
        }
    }

    #[test]
    fn decode_respects_page_size() {
        let wide = SegmentLayout {
            page_size: 16,
            ..LAYOUT
        };

        let va = wide.decode(1024 + 16 + 3).unwrap();
        assert_eq!(va.page, 1);
        assert_eq!(va.offset, 3);

        let va = LAYOUT.decode(1024 + 16 + 3).unwrap();
        assert_eq!(va.page, 2);
        assert_eq!(va.offset, 3);
    }

    #[test]
    fn addresses_past_configured_size_are_rejected() {
        assert!(LAYOUT.decode(81).is_none());
        assert!(LAYOUT.decode(1024 + 41).is_none());
        assert!(LAYOUT.decode(2048 + 41).is_none());
        assert!(LAYOUT.decode(3072 + 40).is_none());
    }

    #[test]
    fn upper_bound_is_inclusive_except_heap_stack() {
        // The boundary address itself is inside the range for the first
        // three segments, exclusive for heap/stack.
        assert!(LAYOUT.contains(Segment::Text, 80));
        assert!(LAYOUT.contains(Segment::Data, 1024 + 40));
        assert!(LAYOUT.contains(Segment::Bss, 2048 + 40));
        assert!(!LAYOUT.contains(Segment::HeapStack, 3072 + 40));
    }

    #[test]
    fn boundary_address_has_no_page() {
        // In range per the inclusive check, but one page past the table.
        assert!(LAYOUT.decode(80).is_none());
        assert!(LAYOUT.decode(1024 + 40).is_none());
        assert!(LAYOUT.decode(2048 + 40).is_none());
    }

    #[test]
    fn last_byte_of_each_segment_decodes() {
        let va = LAYOUT.decode(79).unwrap();
        assert_eq!((va.segment, va.page, va.offset), (Segment::Text, 9, 7));

        let va = LAYOUT.decode(3072 + 39).unwrap();
        assert_eq!((va.segment, va.page, va.offset), (Segment::HeapStack, 4, 7));
    }

    #[test]
    fn addresses_wider_than_twelve_bits_are_rejected() {
        // The segment id comes from the low twelve bits, the range check
        // from the raw value.
        assert!(LAYOUT.decode(4096).is_none());
        assert!(LAYOUT.decode(4096 + 1024).is_none());
        assert!(LAYOUT.decode(u16::MAX).is_none());
    }

    #[test]
    fn swappable_excludes_text() {
        assert!(!Segment::Text.swappable());
        assert!(Segment::Data.swappable());
        assert!(Segment::Bss.swappable());
        assert!(Segment::HeapStack.swappable());
    }

    #[test]
    fn display_formats() {
        let va = LAYOUT.decode(1024 + 5).unwrap();
        let s = format!("{va}");
        assert!(s.contains("data"));
        assert!(s.contains("page 0"));
        assert!(s.contains("offset 5"));
    }
}
