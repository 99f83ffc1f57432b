//! 内置目录：目标人群（persona）与设计风格（designer）
//!
//! 与合成服务端的列表保持同一组 id；视图用它给 fingerprint 配上可读名称。
//! 未知 id 照样可以请求生成（由服务端决定），只是没有名称。

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Persona {
    pub id: u32,
    pub label: &'static str,
    pub prompt: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Designer {
    pub id: u32,
    pub label: &'static str,
    pub prompt: &'static str,
}

pub const PERSONAS: &[Persona] = &[
    Persona {
        id: 1,
        label: "Event Organizer",
        prompt: "Event organizers looking to create a user-friendly form for event registration.",
    },
    Persona {
        id: 2,
        label: "Personal Coach",
        prompt: "Personal coaches building introspective intake forms for their clients.",
    },
    Persona {
        id: 3,
        label: "HR Manager",
        prompt: "HR managers creating onboarding and employee insight forms with complex level of details.",
    },
];

pub const DESIGNERS: &[Designer] = &[
    Designer {
        id: 1,
        label: "Minimalist Designer",
        prompt: "Clean, modern, minimalist design with plenty of white space and subtle typography.",
    },
    Designer {
        id: 2,
        label: "Playful & Creative Designer",
        prompt: "Fun, colorful and lively UI with rounded corners, soft shadows and vibrant accents.",
    },
    Designer {
        id: 3,
        label: "Professional & Corporate Designer",
        prompt: "Formal, polished, enterprise-level design with structured grid layouts.",
    },
];

pub fn persona(id: u32) -> Option<&'static Persona> {
    PERSONAS.iter().find(|p| p.id == id)
}

pub fn designer(id: u32) -> Option<&'static Designer> {
    DESIGNERS.iter().find(|d| d.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(persona(3).map(|p| p.label), Some("HR Manager"));
        assert_eq!(designer(2).map(|d| d.label), Some("Playful & Creative Designer"));
        assert!(persona(9).is_none());
        assert!(designer(0).is_none());
    }
}
