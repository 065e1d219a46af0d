//! Creative format catalogue.
//!
//! Each format has a display label, an optional one-line definition used by
//! the concept agent, and an optional layout template used when assembling
//! the image prompt. Templates may reference `{{angle}}`, `{{productName}}`
//! and `{{visualScene}}`.

use serde::{Deserialize, Serialize};

macro_rules! creative_formats {
    ($($variant:ident => $key:literal, $label:literal;)+) => {
        /// A creative ad format.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum CreativeFormat {
            $(
                #[serde(rename = $key)]
                #[doc = $label]
                $variant,
            )+
        }

        impl CreativeFormat {
            /// Every known format, in catalogue order.
            pub const ALL: &'static [CreativeFormat] = &[$(CreativeFormat::$variant),+];

            /// Stable identifier used on the wire.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(CreativeFormat::$variant => $key,)+
                }
            }

            /// Display label, also used as the creative node title.
            pub fn label(&self) -> &'static str {
                match self {
                    $(CreativeFormat::$variant => $label,)+
                }
            }
        }
    };
}

creative_formats! {
    CarouselEducational => "CAROUSEL_EDUCATIONAL", "Carousel: Educational / Tips";
    CarouselTestimonial => "CAROUSEL_TESTIMONIAL", "Carousel: Testimonial Pile";
    CarouselPanorama => "CAROUSEL_PANORAMA", "Carousel: Seamless Panorama";
    CarouselPhotoDump => "CAROUSEL_PHOTO_DUMP", "Carousel: Photo Dump / Recap";
    CarouselRealStory => "CAROUSEL_REAL_STORY", "Carousel: Real People Story (UGC)";
    BigFont => "BIG_FONT", "Big Font / Text Heavy";
    GmailUx => "GMAIL_UX", "Gmail / Letter Style";
    Billboard => "BILLBOARD", "Billboard Ad";
    UglyVisual => "UGLY_VISUAL", "Ugly Visual / Problem Focus";
    MsPaint => "MS_PAINT", "MS Paint / Nostalgia";
    RedditThread => "REDDIT_THREAD", "Reddit Thread";
    Meme => "MEME", "Meme / Internet Culture";
    LongText => "LONG_TEXT", "Long Text / Story";
    Cartoon => "CARTOON", "Cartoon / Illustration";
    BeforeAfter => "BEFORE_AFTER", "Before & After";
    Whiteboard => "WHITEBOARD", "Whiteboard / Diagram";
    TwitterRepost => "TWITTER_REPOST", "Twitter/X Repost";
    PhoneNotes => "PHONE_NOTES", "iPhone Notes App";
    AestheticMinimal => "AESTHETIC_MINIMAL", "Aesthetic / Text Overlay";
    StoryPoll => "STORY_POLL", "Story: Standard Poll (Yes/No)";
    StoryQna => "STORY_QNA", "Story: Ask Me Anything (Influencer Style)";
    ReelsThumbnail => "REELS_THUMBNAIL", "Reels Cover / Fake Video";
    DmNotification => "DM_NOTIFICATION", "DM Notification";
    UgcMirror => "UGC_MIRROR", "UGC Mirror Selfie";
    UsVsThem => "US_VS_THEM", "Us vs Them / Comparison Table";
    GraphChart => "GRAPH_CHART", "Graph / Data Visualization";
    TimelineJourney => "TIMELINE_JOURNEY", "Timeline / Roadmap";
    ChatConversation => "CHAT_CONVERSATION", "Chat Bubble / WhatsApp";
    ReminderNotif => "REMINDER_NOTIF", "Lockscreen Reminder";
    SocialCommentStack => "SOCIAL_COMMENT_STACK", "Social Comment Stack";
    HandheldTweet => "HANDHELD_TWEET", "Handheld Tweet Overlay";
    PovHands => "POV_HANDS", "POV / Hands-on";
    AnnotatedProduct => "ANNOTATED_PRODUCT", "Annotated / Feature Breakdown";
    SearchBar => "SEARCH_BAR", "Search Bar UI";
    BenefitPointers => "BENEFIT_POINTERS", "Benefit Pointers / Anatomy";
    CollageScrapbook => "COLLAGE_SCRAPBOOK", "Collage / Scrapbook";
    ChecklistTodo => "CHECKLIST_TODO", "Checklist / To-Do";
    StickyNoteRealism => "STICKY_NOTE_REALISM", "Sticky Note / Handwritten";
}

/// Carousel sub-formats that drive different slide workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarouselKind {
    /// Two-phase: plan 5 image+caption pairs, then render each.
    RealStory,
    /// Title card / method / summary slides.
    Educational,
    /// Hook / solution / result slides.
    Standard,
}

impl CreativeFormat {
    /// `Some` for the five carousel formats.
    pub fn carousel_kind(&self) -> Option<CarouselKind> {
        match self {
            CreativeFormat::CarouselRealStory => Some(CarouselKind::RealStory),
            CreativeFormat::CarouselEducational => Some(CarouselKind::Educational),
            CreativeFormat::CarouselTestimonial
            | CreativeFormat::CarouselPanorama
            | CreativeFormat::CarouselPhotoDump => Some(CarouselKind::Standard),
            _ => None,
        }
    }

    /// True for the five multi-slide formats.
    pub fn is_carousel(&self) -> bool {
        self.carousel_kind().is_some()
    }

    /// Carousels whose slide prompts are passed straight to the image model.
    pub fn passes_prompt_through(&self) -> bool {
        matches!(
            self,
            CreativeFormat::CarouselRealStory
                | CreativeFormat::CarouselEducational
                | CreativeFormat::CarouselTestimonial
        )
    }

    /// Short definition given to the concept agent.
    pub fn definition(&self) -> Option<&'static str> {
        use CreativeFormat::*;
        let text = match self {
            PovHands => "First-person view looking down at hands using the product.",
            UsVsThem => "Split screen comparison. Left side = bad/struggle, Right side = good/solution.",
            CollageScrapbook => "Chaotic mix of photos, stickers, and paper cutouts.",
            ReelsThumbnail => "Vertical image with a catchy 'Hook Title' overlay and a shocked/expressive face.",
            GmailUx => "Email interface showing subject line and sender.",
            RedditThread => "Reddit dark mode thread with title and upvotes.",
            MsPaint => "Badly drawn, pixelated MS Paint drawing.",
            Meme => "Impact font top/bottom text over a funny image.",
            DmNotification => "Blurred lifestyle background with an Instagram DM notification overlay.",
            TwitterRepost => "Social media text post styled like Twitter/X.",
            PhoneNotes => "iPhone Notes app text list.",
            GraphChart => "A visual chart or graph showing improvement.",
            BeforeAfter => "Split screen: Before state vs After state.",
            SocialCommentStack => "Floating social media comments.",
            BenefitPointers => "Product shot with lines pointing to features.",
            StickyNoteRealism => "Handwritten sticky note.",
            HandheldTweet => "Hand holding phone showing a tweet.",
            SearchBar => "Google search bar with query.",
            BigFont => "Large bold typography.",
            UglyVisual => "Flash photography, raw, unpolished.",
            LongText => "Long text message block.",
            Cartoon => "Flat vector illustration.",
            Whiteboard => "Hand drawing diagram on whiteboard.",
            _ => return None,
        };
        Some(text)
    }

    /// Strict layout template for the image model.
    pub fn layout_template(&self) -> Option<&'static str> {
        use CreativeFormat::*;
        let text = match self {
            GmailUx => "A close-up screenshot of a Gmail inbox interface on a desktop screen. The email subject line is clearly visible as a catchy subject related to '{{angle}}'. The sender name is '{{productName}}'. Clean white UI, unread email bold font.",
            RedditThread => "A dark-mode Reddit mobile app interface screenshot. A text post is visible. The thread title reads an engaging question or confession about '{{angle}}'. Upvote buttons and comment icons are visible below. Authentic UI details.",
            MsPaint => "A nostalgic Windows 95 / XP computer screen showing the MS Paint application. A crude, intentionally amateur drawing related to {{productName}} is on the canvas. Retro aesthetic, pixelated icons.",
            Meme => "A classic internet meme format image. Top text and bottom text format. The visual is funny and relates to {{visualScene}}. High contrast white impact font with black outline. Text relates to the struggle of '{{angle}}'.",
            DmNotification => "A blurred aesthetic lifestyle background ({{visualScene}}). In the center, a clear iOS lock screen notification banner pops up. The notification is from 'Instagram', message reads a short, intriguing DM related to: '{{angle}}'. Glassmorphism effect.",
            ReelsThumbnail => "A high-energy YouTube/Reels thumbnail style. A person making a shocked or expressive face looking at {{productName}}. Large, bold text overlay presents a short 3-word hook about '{{angle}}' (DO NOT just write the angle name). High saturation, expressive, clickbait style.",
            BigFont => "A solid color background with massive, bold typography filling the frame. The text reads a short, punchy headline about: '{{angle}}'. Minimalist, brutalist design. High contrast.",
            UglyVisual => "A raw, flash-photography photo of a messy or 'ugly' situation related to the concept of {{angle}}. Intentionally unpolished, amateur aesthetic. High contrast, direct flash.",
            LongText => "A screenshot of a long text message bubble on a smartphone. The header text relates to '{{angle}}'. Wall of text, authentic storytelling vibe. Blue or Green bubble.",
            Cartoon => "A simple flat vector cartoon illustration. Characters are discussing {{productName}}. A speech bubble clearly reads a short line of dialogue about: '{{angle}}'.",
            Whiteboard => "A photo of a whiteboard with a hand drawing a diagram explaining the concept of {{angle}}. Marker texture, scribbles, 'class is in session' vibe.",
            SearchBar => "A close-up of a Google Search bar on a clean white background. The text typed in the search bar is a common user query about: '{{angle}}'. The cursor is blinking. Minimalist UI.",
            GraphChart => "A professional data visualization chart. The X-axis represents time, Y-axis represents 'Results'. A line goes up dramatically. Labels relate to {{productName}}. Chart Title: '{{angle}}'. Clean vector style.",
            TimelineJourney => "A visual timeline infographic. Point A is 'Before', Point B is 'After'. The journey shows the transformation using {{productName}}. Text label highlights the phase: '{{angle}}'.",
            ChatConversation => "A screenshot of a smartphone chat conversation. Green/Blue bubbles. The last message sent reads a natural text about: '{{angle}}'. Context: {{visualScene}}.",
            ReminderNotif => "A close-up of a smartphone lock screen showing a 'Reminder' app notification. The reminder text is a short, urgent note about: '{{angle}}'. Background is a blurred wallpaper of {{visualScene}}.",
            AnnotatedProduct => "A high-end product shot of {{productName}}. White lines and text labels point to key features. The main label highlights the benefit of: '{{angle}}'. Tech review style.",
            BeforeAfter => "A split composition. Left side shows a problem state ({{visualScene}}). Right side shows the solution state with {{productName}}. Text overlay 'BEFORE' and 'AFTER'.",
            UgcMirror => "A mirror selfie shot. A person holding {{productName}} while looking in the mirror. Phone covers face slightly. Casual, authentic influencer vibe. Context: {{angle}}.",
            AestheticMinimal => "A minimalist, beige-aesthetic shot of {{productName}} on a marble table. Hard shadows, natural light. Text overlay in thin serif font reads a short aesthetic word related to: '{{angle}}'.",
            ChecklistTodo => "A close-up of a paper notebook or whiteboard with a handwritten checklist. The title relates to '{{angle}}'. Items are checked off. Focus on the handwriting and texture.",
            CollageScrapbook => "A chaotic aesthetic scrapbook collage. Cutout photos of {{productName}}, handwritten notes about '{{angle}}', stickers, and tape textures. Mixed media art style.",
            StickyNoteRealism => "A real yellow post-it sticky note stuck on a surface. Handwritten black marker text on the note reads a reminder about: '{{angle}}'. Sharp focus on the text, realistic paper texture, soft shadows.",
            SocialCommentStack => "A graphic design showing floating social media comment bubbles on a clean background. Top comment: 'Highly recommended!'. Middle comment reads an enthusiastic review about: '{{angle}}'. Bottom comment: 'Booking mine now!'. Clean UI, sharp text, modern aesthetic.",
            HandheldTweet | TwitterRepost => "A photorealistic close-up POV shot of a hand holding a modern smartphone. On the screen, a social media post is clearly visible. The text is a short tweet about: '{{angle}}'. The background is blurred {{visualScene}}. High resolution, screen reflection, authentic UI.",
            PhoneNotes => "A close-up screenshot of the Apple Notes app UI on an iPhone. The text typed in the note is a header about: '{{angle}}'. The background is the standard paper texture of the Notes app. At the bottom, a checklist related to {{productName}}. Photorealistic screen capture.",
            UsVsThem => "A split screen comparison image. Left side (Them): Cloudy, sad, messy, labeled 'Them'. Right side (Us): Bright, happy, organized, labeled 'Us'. The subject is related to: {{productName}}. Comparison point relates to: {{angle}}.",
            BenefitPointers => "A high-quality product photography shot of {{productName}} (or the main subject of the service). Clean background. There are sleek, modern graphic lines pointing to 3 key features of the subject. The style is 'Anatomy Breakdown'. (Note: The pointers are the main visual hook).",
            StoryPoll => "An Instagram Story interface. Background is {{visualScene}}. A 'Poll' sticker is overlaid. Question asks about: '{{angle}}'. Options: 'Yes' / 'No'.",
            StoryQna => "An Instagram Story interface. Background is {{visualScene}}. A 'Q&A' box sticker is overlaid. Question asked relates to: '{{angle}}'.",
            _ => return None,
        };
        Some(text)
    }
}

impl std::fmt::Display for CreativeFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for CreativeFormat {
    type Err = String;

    /// Accepts either the wire identifier or the display label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        CreativeFormat::ALL
            .iter()
            .copied()
            .find(|f| f.as_str().eq_ignore_ascii_case(trimmed) || f.label() == trimmed)
            .ok_or_else(|| format!("Unknown creative format: {}", s))
    }
}

/// A named group of formats for presentation.
#[derive(Debug, Clone, Serialize)]
pub struct FormatGroup {
    /// Group heading.
    pub name: &'static str,
    /// Formats in display order.
    pub formats: Vec<FormatEntry>,
}

/// One catalogue entry.
#[derive(Debug, Clone, Serialize)]
pub struct FormatEntry {
    /// Wire id.
    pub id: CreativeFormat,
    /// Display label.
    pub label: &'static str,
    /// Whether the format renders slides.
    pub carousel: bool,
}

impl From<CreativeFormat> for FormatEntry {
    fn from(format: CreativeFormat) -> Self {
        Self {
            id: format,
            label: format.label(),
            carousel: format.is_carousel(),
        }
    }
}

/// The catalogue grouped the way the format picker presents it.
pub fn format_groups() -> Vec<FormatGroup> {
    use CreativeFormat::*;
    let groups: [(&'static str, &[CreativeFormat]); 8] = [
        (
            "Carousel Specials (High Engagement)",
            &[
                CarouselRealStory,
                CarouselEducational,
                CarouselTestimonial,
                CarouselPanorama,
                CarouselPhotoDump,
            ],
        ),
        (
            "Instagram Native",
            &[
                StoryQna,
                StoryPoll,
                ReelsThumbnail,
                DmNotification,
                UgcMirror,
                PhoneNotes,
                TwitterRepost,
            ],
        ),
        (
            "Direct Response Winners",
            &[BenefitPointers, SocialCommentStack, StickyNoteRealism, HandheldTweet],
        ),
        ("Logic & Rational", &[UsVsThem, GraphChart, TimelineJourney]),
        ("Social Proof & Voyeurism", &[ChatConversation, ReminderNotif]),
        ("Product Centric", &[PovHands, AnnotatedProduct, SearchBar]),
        ("Aesthetic & Mood", &[CollageScrapbook, ChecklistTodo, AestheticMinimal]),
        (
            "Pattern Interrupts",
            &[
                BigFont,
                GmailUx,
                UglyVisual,
                MsPaint,
                Meme,
                LongText,
                BeforeAfter,
                Cartoon,
                Whiteboard,
                RedditThread,
                Billboard,
            ],
        ),
    ];

    groups
        .into_iter()
        .map(|(name, formats)| FormatGroup {
            name,
            formats: formats.iter().copied().map(FormatEntry::from).collect(),
        })
        .collect()
}
