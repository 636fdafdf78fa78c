use super::FormatDescriptor;
use crate::model::ArtifactKind;

const RAW: FormatDescriptor = FormatDescriptor { key: "raw",
                                                 extension: "",
                                                 description: "Raw bytes" };

static GENERIC_FORMATS: &[FormatDescriptor] = &[RAW];

static OBJECT_FORMATS: &[FormatDescriptor] = &[FormatDescriptor { key: "json",
                                                                  extension: "json",
                                                                  description: "Serialized object (JSON)" }];

static TABLE_FORMATS: &[FormatDescriptor] = &[FormatDescriptor { key: "csv",
                                                                 extension: "csv",
                                                                 description: "Comma-separated values" },
                                              FormatDescriptor { key: "excel",
                                                                 extension: "xlsx",
                                                                 description: "Excel workbook" },
                                              FormatDescriptor { key: "json",
                                                                 extension: "json",
                                                                 description: "JSON document" },
                                              FormatDescriptor { key: "html",
                                                                 extension: "html",
                                                                 description: "HTML table" }];

static PLOT_FORMATS: &[FormatDescriptor] = &[FormatDescriptor { key: "html",
                                                                extension: "html",
                                                                description: "Standalone HTML page" },
                                             FormatDescriptor { key: "components",
                                                                extension: "json",
                                                                description: "Embeddable script/div pair" }];

pub fn formats_for(kind: ArtifactKind) -> &'static [FormatDescriptor] {
    match kind {
        ArtifactKind::Generic => GENERIC_FORMATS,
        ArtifactKind::Object => OBJECT_FORMATS,
        ArtifactKind::Table => TABLE_FORMATS,
        ArtifactKind::Plot => PLOT_FORMATS,
    }
}

pub fn default_format_for(kind: ArtifactKind) -> &'static str {
    match kind {
        ArtifactKind::Generic => "raw",
        ArtifactKind::Object => "json",
        ArtifactKind::Table => "excel",
        ArtifactKind::Plot => "html",
    }
}
