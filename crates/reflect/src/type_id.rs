//! Contains the definition of the [`TypeID`] type.
//!
//! The mixing kernel below only hashes type names into cache keys. It is not
//! a general-purpose or collision-resistant hasher.

/// A stable 128-bit identity for a runtime type.
///
/// Unlike [`std::any::TypeId`], a `TypeID` is derived purely from the type's
/// canonical name and, for unnamed composite types, from the identities of
/// its element types. Two descriptors built independently for `[]int` will
/// therefore always compare equal, which is what makes them usable as codec
/// cache keys.
///
/// # Construction
///
/// 1. **From a name**: [`from_name`](Self::from_name), used for named types
///    such as `int` or `Node`.
/// 2. **By combining existing IDs**: [`combine`](Self::combine), used for
///    composite types such as `map[string]int`.
///
/// ```ignore
/// let slice = TypeID::from_name("[]");
/// let int = TypeID::from_name("int");
///
/// assert_eq!(slice.combine(int), slice.combine(int));
/// assert_ne!(slice.combine(int), int.combine(slice));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeID(u64, u64);

impl TypeID {
    /// Hashes a type name into a [`TypeID`].
    ///
    /// Uses a const-compatible, SipHash-like 128-bit mixing function; equal
    /// names always produce equal IDs.
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        const K0: u64 = 0x736f_6d65_7073_6575;
        const K1: u64 = 0x646f_7261_6e64_6f6d;
        const K2: u64 = 0x6c79_6765_6e65_7261;
        const K3: u64 = 0x7465_6462_7974_6573;

        let bytes = name.as_bytes();
        let len = bytes.len();

        let mut v0 = K0;
        let mut v1 = K1;
        let mut v2 = K2;
        let mut v3 = K3;

        v0 ^= len as u64;
        v1 ^= (len as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);

        let mut i = 0;
        while i + 8 <= len {
            let chunk = Self::read_u64_le(bytes, i);
            v0 ^= chunk;
            Self::sipround(&mut v0, &mut v1, &mut v2, &mut v3);
            Self::sipround(&mut v0, &mut v1, &mut v2, &mut v3);
            v3 ^= chunk;
            i += 8;
        }

        let mut tail = 0u64;
        let mut shift = 0;
        while i < len {
            tail |= (bytes[i] as u64) << shift;
            shift += 8;
            i += 1;
        }

        v0 ^= tail;
        Self::sipround(&mut v0, &mut v1, &mut v2, &mut v3);
        Self::sipround(&mut v0, &mut v1, &mut v2, &mut v3);
        v3 ^= tail;

        let mut round = 0;
        while round < 4 {
            Self::sipround(&mut v0, &mut v1, &mut v2, &mut v3);
            round += 1;
        }

        v0 ^= v2;
        v1 ^= v3;
        Self::sipround(&mut v0, &mut v1, &mut v2, &mut v3);
        Self::sipround(&mut v0, &mut v1, &mut v2, &mut v3);

        Self(v0 ^ v1, v2 ^ v3)
    }

    /// Combines two IDs into the ID of a composite type.
    ///
    /// The combination is order sensitive: `a.combine(b) != b.combine(a)`,
    /// so `map[string]int` and `map[int]string` never collide.
    #[must_use]
    pub const fn combine(self, other: Self) -> Self {
        let mut v0 = self.0 ^ 0x736f_6d65_7073_6575;
        let mut v1 = self.1 ^ 0x646f_7261_6e64_6f6d;
        let mut v2 = other.0 ^ 0x6c79_6765_6e65_7261;
        let mut v3 = other.1 ^ 0x7465_6462_7974_6573;

        Self::sipround(&mut v0, &mut v1, &mut v2, &mut v3);
        Self::sipround(&mut v0, &mut v1, &mut v2, &mut v3);

        // asymmetry so that the operand order matters
        v0 ^= 0x1f83_d9ab_fb41_bd6b;
        v1 ^= 0x5be0_cd19_137e_2179;

        Self::sipround(&mut v0, &mut v1, &mut v2, &mut v3);
        Self::sipround(&mut v0, &mut v1, &mut v2, &mut v3);

        v0 ^= v2;
        v1 ^= v3;
        v2 ^= v0.wrapping_mul(0x9e37_79b9_7f4a_7c15);
        v3 ^= v1.wrapping_mul(0xc2b2_ae35_86d4_0f00);

        Self::sipround(&mut v0, &mut v1, &mut v2, &mut v3);

        Self(v0 ^ v1, v2 ^ v3)
    }

    const fn read_u64_le(bytes: &[u8], start: usize) -> u64 {
        (bytes[start] as u64)
            | ((bytes[start + 1] as u64) << 8)
            | ((bytes[start + 2] as u64) << 16)
            | ((bytes[start + 3] as u64) << 24)
            | ((bytes[start + 4] as u64) << 32)
            | ((bytes[start + 5] as u64) << 40)
            | ((bytes[start + 6] as u64) << 48)
            | ((bytes[start + 7] as u64) << 56)
    }

    const fn sipround(v0: &mut u64, v1: &mut u64, v2: &mut u64, v3: &mut u64) {
        *v0 = v0.wrapping_add(*v1);
        *v1 = v1.rotate_left(13);
        *v1 ^= *v0;
        *v0 = v0.rotate_left(32);

        *v2 = v2.wrapping_add(*v3);
        *v3 = v3.rotate_left(16);
        *v3 ^= *v2;

        *v0 = v0.wrapping_add(*v3);
        *v3 = v3.rotate_left(21);
        *v3 ^= *v0;

        *v2 = v2.wrapping_add(*v1);
        *v1 = v1.rotate_left(17);
        *v1 ^= *v2;
        *v2 = v2.rotate_left(32);
    }
}
