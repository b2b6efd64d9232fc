//! Turns a parameter set into the instruction sent with the images.
//!
//! The output is part of the stored history, so its wording and line order
//! must stay stable: regenerating a result rebuilds the same string.

use crate::options::{DEFAULT_CAMERA_SHOT, NEUTRAL_FACE, aspect_ratio_token};
use crate::params::VariationParams;

const PREAMBLE: &str = "Edita la PRIMERA imagen proporcionada (la imagen principal) con las siguientes instrucciones, asegurando que el resultado sea una imagen nítida y de alta calidad de 2048px en su lado más largo.";

const BACKGROUND_IMAGE_CLAUSE: &str = "- Reemplaza el fondo de la imagen principal con la SEGUNDA imagen proporcionada (la imagen de fondo). Integra al sujeto de la imagen principal de forma natural en el nuevo fondo.";

pub fn build_prompt(params: &VariationParams, has_background_image: bool) -> String {
    let mut lines = vec![
        PREAMBLE.to_string(),
        format!("El estilo general debe ser: {}.", params.style),
        format!(
            "La relación de aspecto debe ser: {}.",
            aspect_ratio_token(&params.aspect_ratio)
        ),
    ];

    if has_background_image {
        lines.push(BACKGROUND_IMAGE_CLAUSE.to_string());
    } else if !params.background.is_empty() {
        lines.push(format!("- Cambia el fondo a: {}.", params.background));
    }

    if params.face != NEUTRAL_FACE {
        lines.push(format!("- Cambia la expresión facial a: {}.", params.face));
    }
    if !params.hands.is_empty() {
        lines.push(format!("- Las manos deben estar: {}.", params.hands));
    }
    if !params.clothing.is_empty() {
        lines.push(format!("- Cambia la vestimenta a: {}.", params.clothing));
    }
    if params.camera_shot != DEFAULT_CAMERA_SHOT {
        lines.push(format!("- Usa una toma de cámara de tipo {}.", params.camera_shot));
    }
    if !params.observations.is_empty() {
        lines.push(format!(
            "- Observaciones importantes a seguir: {}.",
            params.observations
        ));
    }
    // Text without a position (or the reverse) is dropped.
    if !params.text.is_empty() && !params.text_position.is_empty() {
        lines.push(format!(
            "- Agrega el texto \"{}\" a la imagen, ubicado en la {}.",
            params.text, params.text_position
        ));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamField;

    fn base_lines(prompt: &str) -> Vec<&str> {
        prompt.split('\n').collect()
    }

    #[test]
    fn default_params_produce_three_lines() {
        let prompt = build_prompt(&VariationParams::default(), false);
        assert_eq!(
            base_lines(&prompt),
            vec![
                PREAMBLE,
                "El estilo general debe ser: Fotorrealista.",
                "La relación de aspecto debe ser: 1:1.",
            ]
        );
    }

    #[test]
    fn text_without_position_adds_nothing() {
        let mut params = VariationParams::default();
        params.text = "¿qué quieres decir?".into();
        assert!(!build_prompt(&params, false).contains("Agrega el texto"));

        let mut params = VariationParams::default();
        params.text_position = "parte superior".into();
        assert!(!build_prompt(&params, false).contains("Agrega el texto"));
    }

    #[test]
    fn text_with_position_adds_overlay_clause() {
        let mut params = VariationParams::default();
        params.text = "Hola".into();
        params.text_position = "parte superior".into();
        let prompt = build_prompt(&params, false);
        assert!(prompt.ends_with("- Agrega el texto \"Hola\" a la imagen, ubicado en la parte superior."));
    }

    #[test]
    fn background_image_takes_precedence_over_description() {
        let mut params = VariationParams::default();
        params.background = "una playa al atardecer".into();

        let with_image = build_prompt(&params, true);
        assert!(with_image.contains(BACKGROUND_IMAGE_CLAUSE));
        assert!(!with_image.contains("Cambia el fondo a"));

        let without_image = build_prompt(&params, false);
        assert!(without_image.contains("- Cambia el fondo a: una playa al atardecer."));
        assert!(!without_image.contains(BACKGROUND_IMAGE_CLAUSE));
    }

    #[test]
    fn aspect_ratio_uses_ratio_token() {
        let mut params = VariationParams::default();
        params.aspect_ratio = "16:9 (Panorámico)".into();
        let prompt = build_prompt(&params, false);
        assert_eq!(base_lines(&prompt)[2], "La relación de aspecto debe ser: 16:9.");
    }

    #[test]
    fn clauses_follow_fixed_order() {
        let mut params = VariationParams::default();
        params.set(ParamField::Observations, "mantener anteojos");
        params.set(ParamField::CameraShot, "Primer Plano");
        params.set(ParamField::Clothing, "tradicional arabe");
        params.set(ParamField::Hands, "juntas en oracion");
        params.set(ParamField::Face, "Feliz");
        params.set(ParamField::Background, "un bosque");
        params.set(ParamField::Text, "Paz");
        params.set(ParamField::TextPosition, "parte inferior");
        params.set(ParamField::Style, "Anime");

        let prompt = build_prompt(&params, false);
        assert_eq!(
            &base_lines(&prompt)[1..],
            &[
                "El estilo general debe ser: Anime.",
                "La relación de aspecto debe ser: 1:1.",
                "- Cambia el fondo a: un bosque.",
                "- Cambia la expresión facial a: Feliz.",
                "- Las manos deben estar: juntas en oracion.",
                "- Cambia la vestimenta a: tradicional arabe.",
                "- Usa una toma de cámara de tipo Primer Plano.",
                "- Observaciones importantes a seguir: mantener anteojos.",
                "- Agrega el texto \"Paz\" a la imagen, ubicado en la parte inferior.",
            ]
        );
    }

    #[test]
    fn same_params_build_identical_prompts() {
        let mut params = VariationParams::default();
        params.face = "Pensativo".into();
        params.camera_shot = "Plano Cenital".into();
        assert_eq!(build_prompt(&params, true), build_prompt(&params.clone(), true));
    }
}
