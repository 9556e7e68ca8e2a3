pub mod family_contract;
pub(crate) mod flux;
mod gpt_image;
mod jobs;
mod kling;
mod luma;
mod midjourney;
mod replicate;
pub(crate) mod request;
mod runway;
pub(crate) mod signals;
mod slides;
mod suno;
mod veo;

use crate::core::types::ProviderFamily;

use family_contract::FamilyCodec;

impl ProviderFamily {
    /// Wire codec for this family.
    pub(crate) fn codec(self) -> &'static dyn FamilyCodec {
        match self {
            Self::FluxStyle => &flux::FluxCodec,
            Self::GptImageStyle => &gpt_image::GptImageCodec,
            Self::MidjourneyStyle => &midjourney::MidjourneyCodec,
            Self::JobsGeneric => &jobs::JobsCodec,
            Self::VeoStyle => &veo::VeoCodec,
            Self::RunwayStyle => &runway::RunwayCodec,
            Self::SunoStyle => &suno::SunoCodec,
            Self::KlingStyle => &kling::KlingCodec,
            Self::LumaStyle => &luma::LumaCodec,
            Self::ReplicateStyle => &replicate::ReplicateCodec,
            Self::SlidesStyle => &slides::SlidesCodec,
        }
    }
}

#[cfg(test)]
mod tests;
