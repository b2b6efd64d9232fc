use serde::Serialize;

pub const NEUTRAL_FACE: &str = "Neutral";
pub const DEFAULT_CAMERA_SHOT: &str = "A Nivel del Ojo";

pub const FACE_OPTIONS: &[&str] = &[
    NEUTRAL_FACE,
    "Feliz",
    "Triste",
    "Sorprendido",
    "Enojado",
    "Sonriendo",
    "Con el ceño fruncido",
    "Pensativo",
    "Guiñando un ojo",
    "Riendo",
    "Serio",
    "Confundido",
    "Alegre",
    "Determinado",
    "Aterrorizado",
    "Exhausto",
    "Extenuado",
    "Lagrimeando",
];

pub const ASPECT_RATIO_OPTIONS: &[&str] = &[
    "1:1 (Cuadrado)",
    "16:9 (Panorámico)",
    "9:16 (Vertical)",
    "4:3 (Estándar)",
    "3:4 (Retrato)",
];

pub const STYLE_OPTIONS: &[&str] = &[
    "Fotorrealista",
    "Cinematográfico",
    "Anime",
    "Arte de Fantasía",
    "Cyberpunk",
    "Foto Antigua",
    "Acuarela",
    "Minimalista",
    "Impresionismo",
    "Pop Art",
    "Steampunk",
    "Art Nouveau",
    "Render 3D",
    "Low Poly",
    "Cómic",
    "Gótico",
    "Vaporwave",
    "Pintura al Óleo",
    "Naif",
    "Romano",
    "Bollywood",
    "Griego",
    "Barroco",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CameraShot {
    pub value: &'static str,
    pub label: &'static str,
}

/// Camera shots offered by the form. The eye-level shot comes first so that
/// a fresh form produces no camera instruction.
pub const CAMERA_SHOT_OPTIONS: &[CameraShot] = &[
    CameraShot {
        value: DEFAULT_CAMERA_SHOT,
        label: "A Nivel del Ojo - Posición neutral, a la altura de la mirada.",
    },
    CameraShot {
        value: "Plano General",
        label: "Plano General - Muestra el cuerpo completo y su entorno.",
    },
    CameraShot {
        value: "Plano Medio",
        label: "Plano Medio - Encuadra de la cintura para arriba.",
    },
    CameraShot {
        value: "Plano Americano",
        label: "Plano Americano - Corta justo por encima de las rodillas.",
    },
    CameraShot {
        value: "Primer Plano",
        label: "Primer Plano - Se centra en el rostro para captar emociones.",
    },
    CameraShot {
        value: "Ángulo Picado",
        label: "Ángulo Picado - La cámara apunta hacia abajo, sugiere vulnerabilidad.",
    },
    CameraShot {
        value: "Ángulo Contrapicado",
        label: "Ángulo Contrapicado - La cámara apunta hacia arriba, denota poder.",
    },
    CameraShot {
        value: "Ángulo Holandés",
        label: "Ángulo Holandés - Eje de la cámara inclinado, crea inestabilidad.",
    },
    CameraShot {
        value: "Plano Cenital",
        label: "Plano Cenital - La cámara apunta directamente hacia abajo, como una vista de pájaro.",
    },
];

/// Accepted upload types for both image slots.
pub const ACCEPTED_IMAGE_TYPES: &[&str] = &["image/png", "image/jpeg", "image/webp"];

/// Returns the ratio part of an aspect ratio option, e.g. `16:9` for
/// `16:9 (Panorámico)`.
pub fn aspect_ratio_token(option: &str) -> &str {
    option.split(' ').next().unwrap_or(option)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionCatalog {
    pub faces: &'static [&'static str],
    pub aspect_ratios: &'static [&'static str],
    pub styles: &'static [&'static str],
    pub camera_shots: &'static [CameraShot],
    pub accepted_image_types: &'static [&'static str],
}

pub fn catalog() -> OptionCatalog {
    OptionCatalog {
        faces: FACE_OPTIONS,
        aspect_ratios: ASPECT_RATIO_OPTIONS,
        styles: STYLE_OPTIONS,
        camera_shots: CAMERA_SHOT_OPTIONS,
        accepted_image_types: ACCEPTED_IMAGE_TYPES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_ratio_token_drops_description() {
        assert_eq!(aspect_ratio_token("16:9 (Panorámico)"), "16:9");
        assert_eq!(aspect_ratio_token("3:4 (Retrato)"), "3:4");
        assert_eq!(aspect_ratio_token("2:3"), "2:3");
        assert_eq!(aspect_ratio_token(""), "");
    }

    #[test]
    fn defaults_lead_their_catalogs() {
        assert_eq!(FACE_OPTIONS[0], NEUTRAL_FACE);
        assert_eq!(CAMERA_SHOT_OPTIONS[0].value, DEFAULT_CAMERA_SHOT);
    }

    #[test]
    fn camera_labels_start_with_value() {
        for shot in CAMERA_SHOT_OPTIONS {
            assert!(shot.label.starts_with(shot.value), "{}", shot.value);
        }
    }
}
