//! Closed vocabularies validated on resource writes

/// Accepted values for the resource type category
pub const LEARNING_RESOURCE_TYPES: &[&str] = &[
    "Assessment/Item",
    "Assessment/Formative",
    "Assessment/Interim",
    "Assessment/Rubric",
    "Assessment/Preparation",
    "Collection/Course",
    "Collection/Unit",
    "Collection/Lesson",
    "Collection/Curriculum Guide",
    "Game",
    "Interactive/Simulation",
    "Interactive/Animation",
    "Interactive/Whiteboard",
    "Activity/Worksheet",
    "Activity/Learning",
    "Activity/Experiment",
    "Lecture",
    "Text/Book",
    "Text/Chapter",
    "Text/Document",
    "Text/Article",
    "Text/Passage",
    "Text/Textbook",
    "Text/Reference",
    "Text/Website",
    "Media/Audio",
    "Media/Video",
    "Media/Images",
    "Other",
];

pub const EDUCATIONAL_AUDIENCE: &[&str] = &[
    "student",
    "teacher",
    "administrator",
    "parent",
    "aide",
    "proctor",
    "guardian",
    "relative",
];

pub const ACCESSIBILITY_API: &[&str] = &[
    "AndroidAccessibility",
    "ARIAv1",
    "ATK",
    "AT-SPI",
    "BlackberryAccessibility",
    "iAccessible2",
    "JavaAccessibility",
    "MacOSXAccessibility",
    "MSAA",
    "UIAutomation",
];

pub const ACCESSIBILITY_INPUT_METHODS: &[&str] = &["fullKeyboardControl", "fullMouseControl"];

pub const ACCESS_MODE: &[&str] = &[
    "auditory",
    "colour",
    "color",
    "itemSize",
    "olfactory",
    "orientation",
    "position",
    "tactile",
    "textOnImage",
    "textual",
    "visual",
];

pub const ACCESSIBILITY_HAZARDS: &[&str] =
    &["flashing", "motionSimulation", "olfactoryHazard", "sound"];

/// Keys permitted in a resource's text-complexity map
pub const TEXT_COMPLEXITY_METRICS: &[&str] =
    &["dra", "dale-chall", "flesch-kincaid", "fountas-pinnell", "lexile"];
