use crate::content::{Common, Content, Language};
use crate::render::layouts::{self, SlideContext};
use crate::render::scene::Scene;
use crate::theme::Theme;

/// The invitation's slides, in reading order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlideKind {
    Cover,
    Invite,
    Programs,
    Compliments,
}

/// Every slide in the order it is shown and exported.
pub const SLIDES: [SlideKind; 4] = [
    SlideKind::Cover,
    SlideKind::Invite,
    SlideKind::Programs,
    SlideKind::Compliments,
];

impl SlideKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Cover => "Cover",
            Self::Invite => "Invite",
            Self::Programs => "Programs",
            Self::Compliments => "Compliments",
        }
    }

    /// Compose this slide's print-size scene for `language`.
    pub fn compose(
        self,
        content: Option<&Content>,
        common: &Common,
        language: Language,
        theme: &Theme,
    ) -> Scene {
        let ctx = SlideContext {
            content,
            common,
            language,
            theme,
        };
        match self {
            Self::Cover => layouts::cover::compose(&ctx),
            Self::Invite => layouts::invite::compose(&ctx),
            Self::Programs => layouts::programs::compose(&ctx),
            Self::Compliments => layouts::compliments::compose(&ctx),
        }
    }
}

impl std::fmt::Display for SlideKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentTable;
    use crate::render::scene::{PAGE_HEIGHT, PAGE_WIDTH};

    #[test]
    fn reading_order() {
        let names: Vec<_> = SLIDES.iter().map(|s| s.name()).collect();
        assert_eq!(names, ["Cover", "Invite", "Programs", "Compliments"]);
    }

    #[test]
    fn every_slide_composes_a_page() {
        let table = ContentTable::builtin();
        let theme = Theme::default();
        for language in [Language::English, Language::LisanUdDawat] {
            for slide in SLIDES {
                let scene = slide.compose(table.get(language), &table.common, language, &theme);
                assert_eq!(scene.width(), PAGE_WIDTH);
                assert_eq!(scene.height(), PAGE_HEIGHT);
                assert!(scene.to_svg().contains("<text"), "{slide} in {language}");
            }
        }
    }
}
