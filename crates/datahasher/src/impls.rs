//! [`StructuralHash`] implementations for primitives, standard library types
//! and the concurrent containers used alongside them.

use std::{
    borrow::Cow,
    cell::{Cell, RefCell},
    collections::{
        BTreeMap, BTreeSet, BinaryHeap, HashMap, HashSet, LinkedList, VecDeque,
    },
    hash::{BuildHasher, Hash},
    marker::PhantomData,
    rc::Rc,
    sync::{Arc, Mutex, PoisonError, RwLock},
};

use crate::{Bytes, Fields, Opaque, StructuralHash, Traversal};

// Primitive leaves

macro_rules! impl_structural_hash_le_bytes {
    ($($type:ty),* $(,)?) => {
        $(
            impl StructuralHash for $type {
                fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
                    state.primitive(self.to_le_bytes())
                }
            }
        )*
    };
}

impl_structural_hash_le_bytes!(u16, u32, u64, u128, i8, i16, i32, i64, i128);

// A run of bytes is a single leaf over the raw bytes, like a string.
impl StructuralHash for u8 {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        state.primitive([*self])
    }

    fn structural_hash_slice(items: &[Self], state: &mut Traversal<'_>) -> u64 {
        state.bytes(items)
    }

    fn structural_hash_iter<'a, I>(items: I, state: &mut Traversal<'_>) -> u64
    where
        Self: 'a,
        I: IntoIterator<Item = &'a Self>,
    {
        let bytes: Vec<u8> = items.into_iter().copied().collect();
        state.bytes(&bytes)
    }
}

// Pointer-sized integers are widened so fingerprints agree across 32- and
// 64-bit targets.
impl StructuralHash for usize {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        state.primitive((*self as u64).to_le_bytes())
    }
}

impl StructuralHash for isize {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        state.primitive((*self as i64).to_le_bytes())
    }
}

// NaN payloads are canonicalized and negative zero compares equal to zero,
// so both fold to a single representation.
impl StructuralHash for f32 {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        let canonical = if self.is_nan() {
            f32::NAN
        } else if *self == 0.0 {
            0.0
        } else {
            *self
        };
        state.primitive(canonical.to_le_bytes())
    }
}

impl StructuralHash for f64 {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        let canonical = if self.is_nan() {
            f64::NAN
        } else if *self == 0.0 {
            0.0
        } else {
            *self
        };
        state.primitive(canonical.to_le_bytes())
    }
}

impl StructuralHash for bool {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        state.primitive([u8::from(*self)])
    }
}

impl StructuralHash for char {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        state.primitive(u32::from(*self).to_le_bytes())
    }
}

impl StructuralHash for str {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        state.bytes(self.as_bytes())
    }
}

impl StructuralHash for String {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        self.as_str().structural_hash(state)
    }
}

impl<T: AsRef<[u8]>> StructuralHash for Bytes<T> {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        state.bytes(self.0.as_ref())
    }
}

impl StructuralHash for std::path::PathBuf {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        self.as_path().structural_hash(state)
    }
}

impl StructuralHash for std::path::Path {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        self.as_os_str().structural_hash(state)
    }
}

impl StructuralHash for std::ffi::OsString {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        self.as_os_str().structural_hash(state)
    }
}

impl StructuralHash for std::ffi::OsStr {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        state.bytes(self.as_encoded_bytes())
    }
}

impl StructuralHash for std::ffi::CString {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        self.as_c_str().structural_hash(state)
    }
}

impl StructuralHash for std::ffi::CStr {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        state.bytes(self.to_bytes())
    }
}

macro_rules! impl_structural_hash_non_zero {
    ($($type:ty),* $(,)?) => {
        $(
            impl StructuralHash for $type {
                fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
                    self.get().structural_hash(state)
                }
            }
        )*
    };
}

impl_structural_hash_non_zero!(
    std::num::NonZeroU8,
    std::num::NonZeroU16,
    std::num::NonZeroU32,
    std::num::NonZeroU64,
    std::num::NonZeroU128,
    std::num::NonZeroUsize,
    std::num::NonZeroI8,
    std::num::NonZeroI16,
    std::num::NonZeroI32,
    std::num::NonZeroI64,
    std::num::NonZeroI128,
    std::num::NonZeroIsize,
);

macro_rules! impl_structural_hash_atomic {
    ($($type:ty),* $(,)?) => {
        $(
            impl StructuralHash for $type {
                fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
                    self.load(std::sync::atomic::Ordering::Relaxed)
                        .structural_hash(state)
                }
            }
        )*
    };
}

impl_structural_hash_atomic!(
    std::sync::atomic::AtomicBool,
    std::sync::atomic::AtomicU8,
    std::sync::atomic::AtomicU16,
    std::sync::atomic::AtomicU32,
    std::sync::atomic::AtomicU64,
    std::sync::atomic::AtomicUsize,
    std::sync::atomic::AtomicI8,
    std::sync::atomic::AtomicI16,
    std::sync::atomic::AtomicI32,
    std::sync::atomic::AtomicI64,
    std::sync::atomic::AtomicIsize,
);

// Transparent pointers

impl<T: StructuralHash + ?Sized> StructuralHash for &T {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        (**self).structural_hash(state)
    }

    fn promote_fields(&self, fields: &mut Fields<'_, '_>) {
        (**self).promote_fields(fields);
    }
}

impl<T: StructuralHash + ?Sized> StructuralHash for &mut T {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        (**self).structural_hash(state)
    }

    fn promote_fields(&self, fields: &mut Fields<'_, '_>) {
        (**self).promote_fields(fields);
    }
}

impl<T: StructuralHash + ?Sized> StructuralHash for Box<T> {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        (**self).structural_hash(state)
    }

    fn promote_fields(&self, fields: &mut Fields<'_, '_>) {
        (**self).promote_fields(fields);
    }
}

impl<T: StructuralHash + ToOwned + ?Sized> StructuralHash for Cow<'_, T> {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        (**self).structural_hash(state)
    }
}

// Shared pointers may close cycles, so they go through the traversal's
// ancestor tracking.
impl<T: StructuralHash + ?Sized> StructuralHash for Rc<T> {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        state.shared(&**self)
    }
}

impl<T: StructuralHash + ?Sized> StructuralHash for Arc<T> {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        state.shared(&**self)
    }
}

impl<T: StructuralHash + ?Sized> StructuralHash for std::rc::Weak<T> {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        match self.upgrade() {
            Some(strong) => strong.structural_hash(state),
            None => state.nil(),
        }
    }
}

impl<T: StructuralHash + ?Sized> StructuralHash for std::sync::Weak<T> {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        match self.upgrade() {
            Some(strong) => strong.structural_hash(state),
            None => state.nil(),
        }
    }
}

// `None` is the nil pointer; `Some` is transparent.
impl<T: StructuralHash> StructuralHash for Option<T> {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        match self {
            Some(value) => value.structural_hash(state),
            None => state.nil(),
        }
    }
}

impl<T: StructuralHash, E: StructuralHash> StructuralHash for Result<T, E> {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        match self {
            Ok(value) => {
                let mut fields = state.variant(0);
                fields.field(value);
                fields.finish()
            }
            Err(error) => {
                let mut fields = state.variant(1);
                fields.field(error);
                fields.finish()
            }
        }
    }
}

// Interior mutability. Locks are read with a blocking acquire so concurrent
// traversals of the same value agree; a `RefCell` that is mutably borrowed
// cannot be waited on and is reported instead.

impl<T: StructuralHash + Copy> StructuralHash for Cell<T> {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        self.get().structural_hash(state)
    }
}

impl<T: StructuralHash + ?Sized> StructuralHash for RefCell<T> {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        match self.try_borrow() {
            Ok(value) => value.structural_hash(state),
            Err(_) => state.unavailable("RefCell"),
        }
    }
}

impl<T: StructuralHash + ?Sized> StructuralHash for Mutex<T> {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        state.locked(self, |state| {
            let value = self.lock().unwrap_or_else(PoisonError::into_inner);
            value.structural_hash(state)
        })
    }
}

impl<T: StructuralHash + ?Sized> StructuralHash for RwLock<T> {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        state.locked(self, |state| {
            let value = self.read().unwrap_or_else(PoisonError::into_inner);
            value.structural_hash(state)
        })
    }
}

impl<T: StructuralHash + ?Sized> StructuralHash for parking_lot::Mutex<T> {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        state.locked(self, |state| self.lock().structural_hash(state))
    }
}

impl<T: StructuralHash + ?Sized> StructuralHash for parking_lot::RwLock<T> {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        state.locked(self, |state| self.read().structural_hash(state))
    }
}

// Ordered sequences. Every sequential container fingerprints like a slice of
// the same elements.

impl<T: StructuralHash> StructuralHash for [T] {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        T::structural_hash_slice(self, state)
    }
}

impl<T: StructuralHash, const N: usize> StructuralHash for [T; N] {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        self.as_slice().structural_hash(state)
    }
}

impl<T: StructuralHash> StructuralHash for Vec<T> {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        self.as_slice().structural_hash(state)
    }
}

impl<T: StructuralHash> StructuralHash for VecDeque<T> {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        match self.as_slices() {
            (front, []) => T::structural_hash_slice(front, state),
            _ => T::structural_hash_iter(self, state),
        }
    }
}

impl<T: StructuralHash> StructuralHash for LinkedList<T> {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        T::structural_hash_iter(self, state)
    }
}

// Unordered mappings and sets.

impl<K: StructuralHash, V: StructuralHash, B> StructuralHash
    for HashMap<K, V, B>
{
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        state.entries(self)
    }
}

impl<K: StructuralHash, V: StructuralHash> StructuralHash for BTreeMap<K, V> {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        state.entries(self)
    }
}

impl<T: StructuralHash, B> StructuralHash for HashSet<T, B> {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        state.unordered(self)
    }
}

impl<T: StructuralHash> StructuralHash for BTreeSet<T> {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        state.unordered(self)
    }
}

impl<T: StructuralHash> StructuralHash for BinaryHeap<T> {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        state.unordered(self)
    }
}

impl<K, V, B> StructuralHash for dashmap::DashMap<K, V, B>
where
    K: StructuralHash + Eq + Hash,
    V: StructuralHash,
    B: BuildHasher + Clone,
{
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        let mut mapping = state.mapping();
        for entry in self {
            mapping.entry(entry.key(), entry.value());
        }
        mapping.finish()
    }
}

impl<K, V, B> StructuralHash for dashmap::ReadOnlyView<K, V, B>
where
    K: StructuralHash + Eq + Hash,
    V: StructuralHash,
    B: BuildHasher + Clone,
{
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        state.entries(self.iter())
    }
}

impl<T, B> StructuralHash for dashmap::DashSet<T, B>
where
    T: StructuralHash + Eq + Hash,
    B: BuildHasher + Clone,
{
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        let mut set = state.set();
        for value in self.iter() {
            set.element(value.key());
        }
        set.finish()
    }
}

// Structs without a derive: tuples, ranges, durations, markers.

macro_rules! impl_structural_hash_tuple {
    () => {
        impl StructuralHash for () {
            fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
                state.structure().finish()
            }
        }
    };
    ($($name:ident)+) => {
        impl<$($name: StructuralHash),+> StructuralHash for ($($name,)+) {
            fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
                let mut fields = state.structure();
                self.promote_fields(&mut fields);
                fields.finish()
            }

            #[allow(non_snake_case)]
            fn promote_fields(&self, fields: &mut Fields<'_, '_>) {
                let ($($name,)+) = self;
                $(fields.field($name);)+
            }
        }
    };
}

impl_structural_hash_tuple!();
impl_structural_hash_tuple!(T);
impl_structural_hash_tuple!(T U);
impl_structural_hash_tuple!(T U V);
impl_structural_hash_tuple!(T U V W);
impl_structural_hash_tuple!(T U V W X);
impl_structural_hash_tuple!(T U V W X Y);
impl_structural_hash_tuple!(T U V W X Y Z);
impl_structural_hash_tuple!(T U V W X Y Z A);
impl_structural_hash_tuple!(T U V W X Y Z A B);
impl_structural_hash_tuple!(T U V W X Y Z A B C);
impl_structural_hash_tuple!(T U V W X Y Z A B C D);
impl_structural_hash_tuple!(T U V W X Y Z A B C D E);

impl<T: StructuralHash> StructuralHash for std::ops::Range<T> {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        let mut fields = state.structure();
        fields.field(&self.start).field(&self.end);
        fields.finish()
    }
}

impl<T: StructuralHash> StructuralHash for std::ops::RangeInclusive<T> {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        let mut fields = state.structure();
        fields.field(self.start()).field(self.end());
        fields.finish()
    }
}

impl<T: StructuralHash> StructuralHash for std::ops::RangeFrom<T> {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        let mut fields = state.structure();
        fields.field(&self.start);
        fields.finish()
    }
}

impl<T: StructuralHash> StructuralHash for std::ops::RangeTo<T> {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        let mut fields = state.structure();
        fields.field(&self.end);
        fields.finish()
    }
}

impl StructuralHash for std::time::Duration {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        let mut fields = state.structure();
        fields.field(&self.as_secs()).field(&self.subsec_nanos());
        fields.finish()
    }
}

impl<T: ?Sized> StructuralHash for PhantomData<T> {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        state.structure().finish()
    }

    fn promote_fields(&self, _fields: &mut Fields<'_, '_>) {}
}

// Opaque kinds: identity-bearing values with no structure to describe.

impl<T> StructuralHash for Opaque<T> {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        state.opaque(std::any::type_name::<T>())
    }
}

impl<T: ?Sized> StructuralHash for *const T {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        state.opaque("*const T")
    }
}

impl<T: ?Sized> StructuralHash for *mut T {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        state.opaque("*mut T")
    }
}

impl<T> StructuralHash for std::sync::mpsc::Sender<T> {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        state.opaque("mpsc::Sender")
    }
}

impl<T> StructuralHash for std::sync::mpsc::SyncSender<T> {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        state.opaque("mpsc::SyncSender")
    }
}

impl<T> StructuralHash for std::sync::mpsc::Receiver<T> {
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
        state.opaque("mpsc::Receiver")
    }
}

macro_rules! impl_structural_hash_fn_pointer {
    ($($arg:ident)*) => {
        impl<R, $($arg),*> StructuralHash for fn($($arg),*) -> R {
            fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
                state.opaque("fn pointer")
            }
        }
    };
}

impl_structural_hash_fn_pointer!();
impl_structural_hash_fn_pointer!(A);
impl_structural_hash_fn_pointer!(A B);
impl_structural_hash_fn_pointer!(A B C);
impl_structural_hash_fn_pointer!(A B C D);
impl_structural_hash_fn_pointer!(A B C D E);
impl_structural_hash_fn_pointer!(A B C D E F);
