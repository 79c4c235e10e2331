use anyhow::{Context, Result};
use bevy::{prelude::*, utils::HashMap};

use crate::snake_game::host::Sfx;

use super::audio::synth::Sound;

pub(super) fn plugin(app: &mut App) {
    app.register_type::<HandleMap<SfxKey>>();
    app.init_resource::<HandleMap<SfxKey>>();
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Reflect, Debug)]
pub enum SfxKey {
    Apple,
    Death,
}

impl SfxKey {
    pub const ALL: [SfxKey; 2] = [SfxKey::Apple, SfxKey::Death];

    /// The chiptune each effect is synthesized from.
    pub fn sound(self) -> Result<Sound> {
        match self {
            SfxKey::Apple => Sound::parse("c3e3g3c4c4", "s", "4", "nnnnf", 7),
            SfxKey::Death => Sound::parse("f3 b2 f2 b1  f1 f1 f1 f1", "p", "44444321", "nnnnnnnf", 9),
        }
        .with_context(|| format!("defining the {self:?} sound"))
    }
}

impl From<Sfx> for SfxKey {
    fn from(sfx: Sfx) -> Self {
        match sfx {
            Sfx::Apple => SfxKey::Apple,
            Sfx::Death => SfxKey::Death,
        }
    }
}

impl AssetKey for SfxKey {
    type Asset = AudioSource;
}

impl FromWorld for HandleMap<SfxKey> {
    fn from_world(world: &mut World) -> Self {
        let mut sources = world.resource_mut::<Assets<AudioSource>>();
        let mut handles = HashMap::default();
        for key in SfxKey::ALL {
            match key.sound().and_then(|sound| sound.to_wav()) {
                Ok(wav) => {
                    let source = AudioSource { bytes: wav.into() };
                    handles.insert(key, sources.add(source));
                }
                Err(err) => warn!("{err:#}"),
            }
        }
        handles.into()
    }
}

pub trait AssetKey: Sized {
    type Asset: Asset;
}

#[derive(Resource, Reflect, Deref, DerefMut)]
#[reflect(Resource)]
pub struct HandleMap<K: AssetKey>(HashMap<K, Handle<K::Asset>>);

impl<K: AssetKey, T> From<T> for HandleMap<K>
where
    T: Into<HashMap<K, Handle<K::Asset>>>,
{
    fn from(value: T) -> Self {
        Self(value.into())
    }
}
