use std::fmt::Write;

use palmistry_page::view::{
    BraceletsView, GenericSectionView, GirdlesView, MountTexturesView, QuadrangleView, ResultView,
    SectionView,
};

pub fn render_report(view: &ResultView) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    write_report(&mut out, view)?;
    Ok(out)
}

fn write_report(out: &mut String, view: &ResultView) -> std::fmt::Result {
    writeln!(out, "Analysis Results")?;
    writeln!(out, "Run ID: {}", or_dash(&view.run_id))?;
    writeln!(out, "Lines detected: {}", view.lines_detected)?;
    writeln!(out, "Image size: {}", view.image_size)?;

    if !view.lines.is_empty() {
        writeln!(out)?;
        writeln!(out, "== Detected Lines ==")?;
        for line in &view.lines {
            writeln!(out, "{}", line.title)?;
            for field in &line.fields {
                writeln!(out, "  {}: {}", field.key, field.value)?;
            }
        }
    }

    if !view.image_meta.is_empty() {
        writeln!(out)?;
        writeln!(out, "== Image Metadata ==")?;
        for field in &view.image_meta {
            writeln!(out, "  {}: {}", field.key, field.value)?;
        }
    }

    for section in &view.sections {
        writeln!(out)?;
        writeln!(out, "== {} ==", section.title())?;
        match section {
            SectionView::MountTextures(mounts) => write_mounts(out, mounts)?,
            SectionView::Girdles(girdles) => write_girdles(out, girdles)?,
            SectionView::Quadrangle(quadrangle) => write_quadrangle(out, quadrangle)?,
            SectionView::Bracelets(bracelets) => write_bracelets(out, bracelets)?,
            SectionView::Generic(generic) => write_generic(out, generic)?,
        }
    }

    if !view.processing_steps.is_empty() {
        writeln!(out)?;
        writeln!(out, "== Processing Steps ==")?;
        for (i, step) in view.processing_steps.iter().enumerate() {
            match &step.description {
                Some(description) => writeln!(out, "{}. {}: {}", i + 1, step.title, description)?,
                None => writeln!(out, "{}. {}", i + 1, step.title)?,
            }
        }
    }
    Ok(())
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}

fn write_mounts(out: &mut String, view: &MountTexturesView) -> std::fmt::Result {
    if !view.overall_analysis.is_empty() {
        writeln!(out, "{}", view.overall_analysis)?;
    }
    for mount in &view.mounts {
        write!(out, "- {}: {}", mount.name, mount.primary_pattern)?;
        if mount.extra_patterns > 0 {
            write!(out, " (+{} more)", mount.extra_patterns)?;
        }
        writeln!(out, " [{}] {}%", mount.clarity.label, mount.confidence)?;
        if !mount.description.is_empty() {
            writeln!(out, "  {}", mount.description)?;
        }
        if !mount.traditional_meaning.is_empty() {
            writeln!(out, "  Meaning: {}", mount.traditional_meaning)?;
        }
    }
    if view.all_clear {
        writeln!(out, "No distinctive texture patterns on any mount.")?;
    }
    if !view.detection_method.is_empty() {
        writeln!(out, "Detection: {}", view.detection_method)?;
    }
    Ok(())
}

fn write_girdles(out: &mut String, view: &GirdlesView) -> std::fmt::Result {
    if !view.summary.is_empty() {
        writeln!(out, "{}", view.summary)?;
    }
    for girdle in &view.girdles {
        writeln!(
            out,
            "- {}: {} {}%",
            girdle.name, girdle.completeness.label, girdle.confidence
        )?;
        if !girdle.description.is_empty() {
            writeln!(out, "  {}", girdle.description)?;
        }
        if let Some(meaning) = girdle.traditional_meaning.as_deref().filter(|m| !m.is_empty()) {
            writeln!(out, "  Meaning: {}", meaning)?;
        }
    }
    if view.all_clear {
        writeln!(out, "No girdles detected.")?;
    }
    if !view.detection_method.is_empty() {
        writeln!(out, "Detection: {}", view.detection_method)?;
    }
    Ok(())
}

fn write_quadrangle(out: &mut String, view: &QuadrangleView) -> std::fmt::Result {
    if !view.description.is_empty() {
        writeln!(out, "{}", view.description)?;
    }
    writeln!(out, "Shape: {}", or_dash(&view.shape))?;
    writeln!(out, "Width: {}", or_dash(&view.width))?;
    writeln!(out, "Area: {}", or_dash(&view.area_classification))?;
    if !view.markings_inside.is_empty() {
        writeln!(out, "Markings: {}", view.markings_inside.join(", "))?;
    }
    if !view.traditional_meaning.is_empty() {
        writeln!(out, "Meaning: {}", view.traditional_meaning)?;
    }
    writeln!(out, "Confidence: {}%", view.confidence)?;
    if !view.detection_method.is_empty() {
        writeln!(out, "Detection: {}", view.detection_method)?;
    }
    Ok(())
}

fn write_bracelets(out: &mut String, view: &BraceletsView) -> std::fmt::Result {
    writeln!(out, "Count: {} ({})", view.count, or_dash(&view.overall_quality.label))?;
    if !view.summary.is_empty() {
        writeln!(out, "{}", view.summary)?;
    }
    for bracelet in &view.bracelets {
        writeln!(
            out,
            "- #{} {}: {}, {} {}%",
            bracelet.number,
            bracelet.position,
            bracelet.continuity.label,
            bracelet.clarity.label,
            bracelet.confidence
        )?;
        if !bracelet.description.is_empty() {
            writeln!(out, "  {}", bracelet.description)?;
        }
        if !bracelet.traditional_meaning.is_empty() {
            writeln!(out, "  Meaning: {}", bracelet.traditional_meaning)?;
        }
    }
    if !view.detection_method.is_empty() {
        writeln!(out, "Detection: {}", view.detection_method)?;
    }
    Ok(())
}

fn write_generic(out: &mut String, view: &GenericSectionView) -> std::fmt::Result {
    for field in &view.fields {
        writeln!(out, "{}: {}", field.key, field.value)?;
    }
    Ok(())
}
