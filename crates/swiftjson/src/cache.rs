//! Per-configuration codec caches and the placeholders that stand in for
//! codecs still under construction.
//!
//! An entry moves from [`Slot::Building`] to [`Slot::Ready`] exactly once.
//! The building entry holds a placeholder codec: a nested resolution of the
//! same type (a cyclic type) receives the placeholder and embeds it. When
//! invoked, the placeholder waits on the [`Latch`] of its construction and
//! then delegates to whatever the cache holds for its type.
//!
//! If construction fails, the building entry is removed and the latch
//! carries the error to every placeholder left behind. Codecs finished during
//! the same [`Attempt`] that embed one of those placeholders are retracted
//! too, so a failed type never leaves a working-looking dependent behind.

use std::{
    fmt,
    sync::{Arc, Weak},
    time::Duration,
};

use dashmap::{DashMap, mapref::entry::Entry};
use fxhash::FxBuildHasher;
use parking_lot::{Condvar, Mutex};
use swiftjson_reflect::{Dynamic, Type, Value};
use swiftjson_stream::{Error, Reader, Writer};
use tracing::warn;

use crate::{
    codec::{Decoder, DecoderRef, Encoder, EncoderRef},
    extension::Extension,
    json::Inner,
    shape::Shape,
};

/// The decode or encode half of resolution.
pub(crate) trait CodecKind: Sized + Send + Sync + 'static {
    type Codec: ?Sized + Send + Sync + 'static;

    /// `"decoder"` or `"encoder"`.
    const NAME: &'static str;

    fn cache(json: &Inner) -> &CodecCache<Self>;

    fn direct(
        extension: &dyn Extension,
        ty: Type,
    ) -> Option<Arc<Self::Codec>>;

    fn decorate(
        extension: &dyn Extension,
        ty: Type,
        codec: Arc<Self::Codec>,
    ) -> Arc<Self::Codec>;

    fn create(
        json: &Inner,
        ty: Type,
        shape: &Shape,
        attempt: &mut Attempt<Self>,
    ) -> Result<Arc<Self::Codec>, Error>;

    fn placeholder(placeholder: Placeholder<Self>) -> Arc<Self::Codec>;
}

/// Decoder resolution.
pub(crate) enum Decoding {}

/// Encoder resolution.
pub(crate) enum Encoding {}

impl CodecKind for Decoding {
    type Codec = dyn Decoder;

    const NAME: &'static str = "decoder";

    fn cache(json: &Inner) -> &CodecCache<Self> { &json.decoders }

    fn direct(extension: &dyn Extension, ty: Type) -> Option<DecoderRef> {
        extension.direct_decoder(ty)
    }

    fn decorate(
        extension: &dyn Extension,
        ty: Type,
        codec: DecoderRef,
    ) -> DecoderRef {
        extension.decorate_decoder(ty, codec)
    }

    fn create(
        json: &Inner,
        ty: Type,
        shape: &Shape,
        attempt: &mut Attempt<Self>,
    ) -> Result<DecoderRef, Error> {
        json.create_decoder(ty, shape, attempt)
    }

    fn placeholder(placeholder: Placeholder<Self>) -> DecoderRef {
        Arc::new(placeholder)
    }
}

impl CodecKind for Encoding {
    type Codec = dyn Encoder;

    const NAME: &'static str = "encoder";

    fn cache(json: &Inner) -> &CodecCache<Self> { &json.encoders }

    fn direct(extension: &dyn Extension, ty: Type) -> Option<EncoderRef> {
        extension.direct_encoder(ty)
    }

    fn decorate(
        extension: &dyn Extension,
        ty: Type,
        codec: EncoderRef,
    ) -> EncoderRef {
        extension.decorate_encoder(ty, codec)
    }

    fn create(
        json: &Inner,
        ty: Type,
        shape: &Shape,
        attempt: &mut Attempt<Self>,
    ) -> Result<EncoderRef, Error> {
        json.create_encoder(ty, shape, attempt)
    }

    fn placeholder(placeholder: Placeholder<Self>) -> EncoderRef {
        Arc::new(placeholder)
    }
}

#[derive(Debug)]
enum Progress {
    Building,
    Done,
    Failed(Error),
}

/// Signalled exactly once when a construction finishes.
#[derive(Debug)]
pub(crate) struct Latch {
    progress: Mutex<Progress>,
    signal: Condvar,
}

impl Latch {
    fn new() -> Self {
        Self {
            progress: Mutex::new(Progress::Building),
            signal: Condvar::new(),
        }
    }

    fn settle(&self, outcome: Progress) {
        let mut progress = self.progress.lock();
        if matches!(*progress, Progress::Building) {
            *progress = outcome;
            self.signal.notify_all();
        }
    }

    pub(crate) fn finish(&self) { self.settle(Progress::Done); }

    pub(crate) fn fail(&self, error: Error) {
        self.settle(Progress::Failed(error));
    }

    /// Blocks until the construction settles. `None` if `timeout` elapses
    /// first.
    fn wait(&self, timeout: Duration) -> Option<Result<(), Error>> {
        let mut progress = self.progress.lock();
        self.signal.wait_while_for(
            &mut progress,
            |progress| matches!(progress, Progress::Building),
            timeout,
        );

        match &*progress {
            Progress::Building => None,
            Progress::Done => Some(Ok(())),
            Progress::Failed(error) => Some(Err(error.clone())),
        }
    }
}

type Slots<K> = DashMap<Type, Slot<K>, FxBuildHasher>;

pub(crate) enum Slot<K: CodecKind> {
    Building { placeholder: Arc<K::Codec>, latch: Arc<Latch> },
    Ready(Arc<K::Codec>),
}

impl<K: CodecKind> Slot<K> {
    fn codec(&self) -> Arc<K::Codec> {
        match self {
            Self::Building { placeholder, .. } => placeholder.clone(),
            Self::Ready(codec) => codec.clone(),
        }
    }
}

/// The outcome of claiming a type for construction.
pub(crate) enum Claim<K: CodecKind> {
    /// Another resolution got there first.
    Taken(Arc<K::Codec>),
    /// The caller must build the codec and settle the latch.
    Build(Arc<Latch>),
}

/// Bookkeeping for one outermost resolution and everything it resolves on
/// the way.
///
/// Open constructions form a stack. Each one tracks the lowest stack index
/// whose placeholder it has embedded, directly or through a nested
/// construction. A codec that finishes while depending on a construction
/// still open below it is provisional: if the attempt fails it is retracted.
pub(crate) struct Attempt<K: CodecKind> {
    open: Vec<Frame>,
    provisional: Vec<(Type, Arc<K::Codec>)>,
}

struct Frame {
    ty: Type,
    low: usize,
}

impl<K: CodecKind> Default for Attempt<K> {
    fn default() -> Self { Self { open: Vec::new(), provisional: Vec::new() } }
}

impl<K: CodecKind> Attempt<K> {
    /// Records that the current construction embeds whatever the cache
    /// handed out for `ty`.
    pub(crate) fn reference(&mut self, ty: Type) {
        let Some(depth) = self.open.iter().position(|frame| frame.ty == ty)
        else {
            return;
        };
        if let Some(top) = self.open.last_mut() {
            top.low = top.low.min(depth);
        }
    }

    pub(crate) fn enter(&mut self, ty: Type) {
        let depth = self.open.len();
        self.open.push(Frame { ty, low: depth });
    }

    /// Closes the innermost construction. Returns `true` if it depends on a
    /// construction that is still open.
    pub(crate) fn leave(&mut self) -> bool {
        let Some(frame) = self.open.pop() else {
            return false;
        };
        let depth = self.open.len();
        if let Some(parent) = self.open.last_mut() {
            parent.low = parent.low.min(frame.low);
        }
        frame.low < depth
    }

    pub(crate) fn provisional(&mut self, ty: Type, codec: Arc<K::Codec>) {
        self.provisional.push((ty, codec));
    }

    /// Retracts every provisional codec. Called once the outermost
    /// construction has failed.
    pub(crate) fn roll_back(self, cache: &CodecCache<K>) -> usize {
        let count = self.provisional.len();
        for (ty, codec) in self.provisional.into_iter().rev() {
            cache.retract(ty, &codec);
        }
        count
    }
}

/// Type to codec mapping for one direction of one configuration.
pub(crate) struct CodecCache<K: CodecKind> {
    slots: Arc<Slots<K>>,
}

impl<K: CodecKind> fmt::Debug for CodecCache<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecCache")
            .field("kind", &K::NAME)
            .field("len", &self.slots.len())
            .finish()
    }
}

impl<K: CodecKind> CodecCache<K> {
    pub(crate) fn new() -> Self { Self { slots: Arc::default() } }

    /// The cached codec for `ty`, which may still be a placeholder.
    pub(crate) fn get(&self, ty: Type) -> Option<Arc<K::Codec>> {
        self.slots.get(&ty).map(|slot| slot.codec())
    }

    /// Installs `codec` as ready, replacing any entry.
    pub(crate) fn insert(&self, ty: Type, codec: Arc<K::Codec>) {
        self.slots.insert(ty, Slot::Ready(codec));
    }

    /// Installs `codec` unless an entry exists, returning whichever codec
    /// ends up cached.
    pub(crate) fn insert_if_absent(
        &self,
        ty: Type,
        codec: Arc<K::Codec>,
    ) -> Arc<K::Codec> {
        self.slots.entry(ty).or_insert(Slot::Ready(codec)).codec()
    }

    /// Atomically installs a placeholder for `ty` unless an entry exists.
    pub(crate) fn claim(&self, ty: Type, timeout: Duration) -> Claim<K> {
        match self.slots.entry(ty) {
            Entry::Occupied(occupied) => Claim::Taken(occupied.get().codec()),
            Entry::Vacant(vacant) => {
                let latch = Arc::new(Latch::new());
                let placeholder = K::placeholder(Placeholder {
                    ty,
                    latch: latch.clone(),
                    slots: Arc::downgrade(&self.slots),
                    timeout,
                });
                vacant.insert(Slot::Building {
                    placeholder,
                    latch: latch.clone(),
                });
                Claim::Build(latch)
            }
        }
    }

    /// Removes the ready entry for `ty` if it is still `codec`.
    pub(crate) fn retract(&self, ty: Type, codec: &Arc<K::Codec>) {
        self.slots.remove_if(&ty, |_, slot| match slot {
            Slot::Ready(ours) => Arc::ptr_eq(ours, codec),
            Slot::Building { .. } => false,
        });
    }

    /// Removes the building entry for `ty` if it still belongs to `latch`.
    pub(crate) fn abandon(&self, ty: Type, latch: &Arc<Latch>) {
        self.slots.remove_if(&ty, |_, slot| match slot {
            Slot::Building { latch: ours, .. } => Arc::ptr_eq(ours, latch),
            Slot::Ready(_) => false,
        });
    }
}

/// Stands in for the codec of a type under construction.
pub(crate) struct Placeholder<K: CodecKind> {
    ty: Type,
    latch: Arc<Latch>,
    slots: Weak<Slots<K>>,
    timeout: Duration,
}

impl<K: CodecKind> fmt::Debug for Placeholder<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Placeholder")
            .field("kind", &K::NAME)
            .field("ty", &self.ty)
            .finish_non_exhaustive()
    }
}

impl<K: CodecKind> Placeholder<K> {
    /// Waits for the construction and fetches the real codec. A failed
    /// construction reports its error unless a codec has been installed for
    /// the type since.
    ///
    /// # Panics
    ///
    /// Panics if the construction has not settled within the configured
    /// timeout.
    fn real(&self) -> Result<Arc<K::Codec>, Error> {
        let Some(outcome) = self.latch.wait(self.timeout) else {
            warn!(
                ty = %self.ty,
                timeout = ?self.timeout,
                "codec construction never finished"
            );
            panic!("real {} not found for cache key: {}", K::NAME, self.ty);
        };
        let ready = self.slots.upgrade().and_then(|slots| {
            slots.get(&self.ty).and_then(|slot| match &*slot {
                Slot::Ready(codec) => Some(codec.clone()),
                Slot::Building { .. } => None,
            })
        });
        if let Some(codec) = ready {
            return Ok(codec);
        }

        // nothing installed: report why
        outcome?;
        Err(Error::Mismatch {
            operation: "ResolveCodec",
            message: format!("no {} is cached for {}", K::NAME, self.ty),
        })
    }
}

impl Decoder for Placeholder<Decoding> {
    fn decode(&self, value: &mut Value, reader: &mut Reader<'_>) {
        match self.real() {
            Ok(decoder) => decoder.decode(value, reader),
            Err(error) => reader.set_error(error),
        }
    }
}

impl Encoder for Placeholder<Encoding> {
    fn is_empty(&self, value: &Value) -> bool {
        self.real().is_ok_and(|encoder| encoder.is_empty(value))
    }

    fn encode(&self, value: &Value, writer: &mut Writer) {
        match self.real() {
            Ok(encoder) => encoder.encode(value, writer),
            Err(error) => writer.set_error(error),
        }
    }

    fn encode_dynamic(&self, value: &Dynamic, writer: &mut Writer) {
        match self.real() {
            Ok(encoder) => encoder.encode_dynamic(value, writer),
            Err(error) => writer.set_error(error),
        }
    }
}
