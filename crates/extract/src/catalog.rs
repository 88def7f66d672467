//! CAP-aligned field declarations for the supported cancer types.
//!
//! Each cancer type is a list of sections; every section is extracted by a
//! separate model call and the results are merged into one record.

use crate::schema::{CancerSchema, CancerType, FieldSpec, SectionSpec};

pub const CATEGORY_OTHERS: &str = "others";

const CATEGORIES: &[&str] = &[
    "stomach",
    "colorectal",
    "breast",
    "esophagus",
    "lung",
    "prostate",
    "thyroid",
    "pancreas",
    "cervix",
    "liver",
    CATEGORY_OTHERS,
];

/// Registry eligibility and primary site of a report.
pub static TRIAGE: SectionSpec = SectionSpec {
    name: "triage",
    instruction: "You are a cancer registrar. Decide whether this report documents a PRIMARY cancer \
excision eligible for cancer registry, and if so which organ the cancer arises from. If no viable \
tumor is present after excision, the case is not eligible. If only carcinoma in situ or high-grade \
dysplasia is present, the case is not eligible.",
    fields: &[
        FieldSpec::boolean(
            "cancer_excision_report",
            "true only if this report is a PRIMARY cancer excision eligible for registry",
        ),
        FieldSpec::choice(
            "cancer_category",
            CATEGORIES,
            "organ the primary cancer arises from; use 'others' for an eligible excision of any \
other primary site; null when not eligible",
        ),
        FieldSpec::text(
            "cancer_category_others_description",
            "the primary organ when cancer_category is 'others'; otherwise null",
        ),
    ],
};

// Shared value sets

const PRESENCE: &[&str] = &["present", "not identified", "cannot be determined"];
const LATERALITY: &[&str] = &["left", "right", "not specified"];
const GRADE_G1_G3: &[&str] = &["G1", "G2", "G3", "GX", "not applicable"];
const GRADE_G1_G4: &[&str] = &["G1", "G2", "G3", "G4", "GX"];
const MARGIN_STATUS: &[&str] = &["involved", "uninvolved", "cannot be assessed"];

// Shared repeated groups

const MARGIN_ENTRY: &[FieldSpec] = &[
    FieldSpec::text("margin_name", "margin as named in the report, e.g. bronchial, radial, vascular"),
    FieldSpec::choice("margin_status", MARGIN_STATUS, "whether tumor involves this margin"),
    FieldSpec::number("distance_mm", "distance from tumor to this margin in millimetres"),
    FieldSpec::text("involved_by", "what involves the margin, e.g. invasive carcinoma, carcinoma in situ"),
];

const NODE_STATION_ENTRY: &[FieldSpec] = &[
    FieldSpec::text("station_name", "lymph node station or site as written, e.g. level 7, subcarinal"),
    FieldSpec::integer("nodes_examined", "number of nodes examined at this station"),
    FieldSpec::integer("nodes_involved", "number of nodes with metastasis at this station"),
    FieldSpec::number("largest_deposit_mm", "size of the largest metastatic deposit in millimetres"),
    FieldSpec::choice("extranodal_extension", PRESENCE, "extranodal extension at this station"),
];

const BIOMARKER_ENTRY: &[FieldSpec] = &[
    FieldSpec::text("biomarker", "marker or test name, e.g. ER, HER2, EGFR, MLH1"),
    FieldSpec::text("result", "reported result, keeping the original wording"),
    FieldSpec::text("method", "testing method if stated, e.g. IHC, FISH, NGS"),
];

const MARGINS_INSTRUCTION: &str = "Extract surgical margin status. Emit one entry per margin named \
in the report. If the report gives no margin information, return an empty list.";
const LYMPH_NODES_INSTRUCTION: &str = "Extract regional lymph node findings. Emit one entry per \
lymph node station or site reported, with counts examined and involved.";
const BIOMARKERS_INSTRUCTION: &str = "Extract ancillary and biomarker test results. Emit one entry \
per marker reported. Return an empty list if none are reported.";
const STAGING_INSTRUCTION: &str = "Extract the pathologic stage classification (AJCC 8th edition) \
exactly as reported. Do not infer a stage that the report does not state.";

const MARGINS_FIELDS: &[FieldSpec] = &[
    FieldSpec::group("margins", MARGIN_ENTRY, "one entry per margin reported"),
    FieldSpec::text("closest_margin", "name of the margin closest to the tumor"),
    FieldSpec::number("closest_margin_distance_mm", "distance to the closest margin in millimetres"),
];

const LYMPH_NODES_FIELDS: &[FieldSpec] = &[
    FieldSpec::integer("regional_nodes_examined", "total regional lymph nodes examined"),
    FieldSpec::integer("regional_nodes_involved", "total regional lymph nodes with metastasis"),
    FieldSpec::group("lymph_nodes", NODE_STATION_ENTRY, "one entry per lymph node station or site"),
];

const BIOMARKERS_FIELDS: &[FieldSpec] = &[
    FieldSpec::group("biomarkers", BIOMARKER_ENTRY, "one entry per biomarker result"),
];

const MARGINS_SECTION: SectionSpec = SectionSpec {
    name: "margins",
    instruction: MARGINS_INSTRUCTION,
    fields: MARGINS_FIELDS,
};

const LYMPH_NODES_SECTION: SectionSpec = SectionSpec {
    name: "lymph_nodes",
    instruction: LYMPH_NODES_INSTRUCTION,
    fields: LYMPH_NODES_FIELDS,
};

const BIOMARKERS_SECTION: SectionSpec = SectionSpec {
    name: "biomarkers",
    instruction: BIOMARKERS_INSTRUCTION,
    fields: BIOMARKERS_FIELDS,
};

/// pT / pN / pM section with organ-specific categories.
macro_rules! staging {
    ($t:expr, $n:expr, $m:expr $(,)?) => {
        SectionSpec {
            name: "staging",
            instruction: STAGING_INSTRUCTION,
            fields: &[
                FieldSpec::text("tnm_descriptors", "y, r or m prefixes if reported, e.g. 'y' after neoadjuvant therapy"),
                FieldSpec::choice("pathologic_t", $t, "primary tumor category (pT)"),
                FieldSpec::choice("pathologic_n", $n, "regional lymph node category (pN)"),
                FieldSpec::choice("pathologic_m", $m, "distant metastasis category (pM); 'not applicable' when not assessed"),
            ],
        }
    };
}

// Lung

const LUNG_NODULE_ENTRY: &[FieldSpec] = &[
    FieldSpec::text("location", "lobe or site of the nodule"),
    FieldSpec::number("size_cm", "greatest dimension in centimetres"),
    FieldSpec::text("histologic_type", "histologic type of the nodule"),
];

const LUNG_SECTIONS: &[SectionSpec] = &[
    SectionSpec {
        name: "nonnested",
        instruction: "Extract the primary lung tumor characteristics.",
        fields: &[
            FieldSpec::choice(
                "procedure",
                &["wedge resection", "segmentectomy", "lobectomy", "bilobectomy", "pneumonectomy", "other"],
                "surgical procedure",
            ),
            FieldSpec::choice("specimen_laterality", LATERALITY, "side of the resected lung"),
            FieldSpec::text("tumor_site", "lobe or bronchus involved, e.g. right upper lobe"),
            FieldSpec::text("histologic_type", "histologic type as written, e.g. invasive adenocarcinoma, acinar predominant"),
            FieldSpec::choice("histologic_grade", GRADE_G1_G3, "histologic grade"),
            FieldSpec::number("tumor_size_cm", "greatest dimension of the tumor in centimetres"),
            FieldSpec::number("invasive_size_cm", "size of the invasive component in centimetres"),
            FieldSpec::choice(
                "tumor_focality",
                &["single focus", "separate tumor nodules", "multiple primaries", "cannot be determined"],
                "tumor focality",
            ),
            FieldSpec::choice(
                "visceral_pleural_invasion",
                &["not identified", "PL1", "PL2", "PL3", "cannot be determined"],
                "visceral pleural invasion",
            ),
            FieldSpec::choice("lymphovascular_invasion", PRESENCE, "lymphovascular invasion"),
            FieldSpec::choice("spread_through_air_spaces", PRESENCE, "tumor spread through air spaces (STAS)"),
            FieldSpec::text("direct_invasion", "adjacent structures directly invaded, if any"),
            FieldSpec::text("treatment_effect", "response to neoadjuvant therapy, e.g. percent residual viable tumor"),
        ],
    },
    staging!(
        &["pTX", "pT0", "pTis", "pT1mi", "pT1a", "pT1b", "pT1c", "pT2a", "pT2b", "pT3", "pT4"],
        &["pNX", "pN0", "pN1", "pN2", "pN3"],
        &["not applicable", "pM1a", "pM1b", "pM1c"],
    ),
    MARGINS_SECTION,
    LYMPH_NODES_SECTION,
    BIOMARKERS_SECTION,
    SectionSpec {
        name: "additional_findings",
        instruction: "Extract additional tumor nodules and other pathologic findings. Emit one entry \
per separate tumor nodule.",
        fields: &[
            FieldSpec::group("additional_nodules", LUNG_NODULE_ENTRY, "one entry per separate tumor nodule"),
            FieldSpec::text("additional_pathologic_findings", "non-neoplastic findings, e.g. emphysema, organizing pneumonia"),
        ],
    },
];

// Colorectal

const COLORECTAL_SECTIONS: &[SectionSpec] = &[
    SectionSpec {
        name: "nonnested",
        instruction: "Extract the primary colorectal tumor characteristics.",
        fields: &[
            FieldSpec::choice(
                "procedure",
                &[
                    "right hemicolectomy",
                    "transverse colectomy",
                    "left hemicolectomy",
                    "sigmoidectomy",
                    "low anterior resection",
                    "abdominoperineal resection",
                    "total colectomy",
                    "transanal excision",
                    "other",
                ],
                "surgical procedure",
            ),
            FieldSpec::text("tumor_site", "segment of colon or rectum involved"),
            FieldSpec::text("histologic_type", "histologic type as written"),
            FieldSpec::choice("histologic_grade", &["low grade", "high grade", "G1", "G2", "G3", "GX"], "histologic grade"),
            FieldSpec::number("tumor_size_cm", "greatest dimension of the tumor in centimetres"),
            FieldSpec::text("tumor_extent", "deepest layer or structure invaded"),
            FieldSpec::choice("macroscopic_perforation", PRESENCE, "macroscopic tumor perforation"),
            FieldSpec::choice("lymphovascular_invasion", PRESENCE, "lymphovascular invasion"),
            FieldSpec::choice("perineural_invasion", PRESENCE, "perineural invasion"),
            FieldSpec::choice("tumor_budding", &["low", "intermediate", "high", "cannot be determined"], "tumor budding score"),
            FieldSpec::integer("tumor_deposits", "number of tumor deposits"),
            FieldSpec::text("treatment_effect", "response to neoadjuvant therapy"),
        ],
    },
    staging!(
        &["pTX", "pT0", "pTis", "pT1", "pT2", "pT3", "pT4a", "pT4b"],
        &["pNX", "pN0", "pN1a", "pN1b", "pN1c", "pN2a", "pN2b"],
        &["not applicable", "pM1a", "pM1b", "pM1c"],
    ),
    MARGINS_SECTION,
    LYMPH_NODES_SECTION,
    BIOMARKERS_SECTION,
];

// Prostate

const PROSTATE_SECTIONS: &[SectionSpec] = &[
    SectionSpec {
        name: "nonnested",
        instruction: "Extract the prostate carcinoma characteristics, including Gleason patterns.",
        fields: &[
            FieldSpec::choice("procedure", &["radical prostatectomy", "other"], "surgical procedure"),
            FieldSpec::number("prostate_weight_g", "prostate weight in grams"),
            FieldSpec::text("histologic_type", "histologic type as written, e.g. acinar adenocarcinoma"),
            FieldSpec::integer("gleason_primary_pattern", "primary Gleason pattern (3-5)"),
            FieldSpec::integer("gleason_secondary_pattern", "secondary Gleason pattern (3-5)"),
            FieldSpec::integer("gleason_tertiary_pattern", "tertiary Gleason pattern if reported"),
            FieldSpec::integer("gleason_score", "total Gleason score"),
            FieldSpec::choice("grade_group", &["1", "2", "3", "4", "5"], "ISUP grade group"),
            FieldSpec::number("tumor_percentage", "percentage of prostate involved by tumor"),
            FieldSpec::choice(
                "extraprostatic_extension",
                &["not identified", "focal", "established", "cannot be determined"],
                "extraprostatic extension",
            ),
            FieldSpec::choice("seminal_vesicle_invasion", PRESENCE, "seminal vesicle invasion"),
            FieldSpec::choice("bladder_neck_invasion", PRESENCE, "urinary bladder neck invasion"),
            FieldSpec::choice("lymphovascular_invasion", PRESENCE, "lymphovascular invasion"),
            FieldSpec::choice("perineural_invasion", PRESENCE, "perineural invasion"),
        ],
    },
    staging!(
        &["pT2", "pT3a", "pT3b", "pT4"],
        &["pNX", "pN0", "pN1"],
        &["not applicable", "pM1a", "pM1b", "pM1c"],
    ),
    MARGINS_SECTION,
    LYMPH_NODES_SECTION,
];

// Esophagus

const ESOPHAGUS_SECTIONS: &[SectionSpec] = &[
    SectionSpec {
        name: "nonnested",
        instruction: "Extract the primary esophageal tumor characteristics.",
        fields: &[
            FieldSpec::choice(
                "procedure",
                &["esophagectomy", "esophagogastrectomy", "endoscopic resection", "other"],
                "surgical procedure",
            ),
            FieldSpec::text("tumor_site", "location, e.g. distal esophagus, gastroesophageal junction"),
            FieldSpec::text("histologic_type", "histologic type as written"),
            FieldSpec::choice("histologic_grade", GRADE_G1_G3, "histologic grade"),
            FieldSpec::number("tumor_size_cm", "greatest dimension of the tumor in centimetres"),
            FieldSpec::text("tumor_extent", "deepest layer or structure invaded"),
            FieldSpec::choice("lymphovascular_invasion", PRESENCE, "lymphovascular invasion"),
            FieldSpec::choice("perineural_invasion", PRESENCE, "perineural invasion"),
            FieldSpec::text("treatment_effect", "response to neoadjuvant therapy"),
        ],
    },
    staging!(
        &["pTX", "pT0", "pTis", "pT1a", "pT1b", "pT2", "pT3", "pT4a", "pT4b"],
        &["pNX", "pN0", "pN1", "pN2", "pN3"],
        &["not applicable", "pM1"],
    ),
    MARGINS_SECTION,
    LYMPH_NODES_SECTION,
];

// Breast

const BREAST_SECTIONS: &[SectionSpec] = &[
    SectionSpec {
        name: "nonnested",
        instruction: "Extract the invasive breast carcinoma characteristics.",
        fields: &[
            FieldSpec::choice(
                "procedure",
                &["excision", "partial mastectomy", "total mastectomy", "modified radical mastectomy", "other"],
                "surgical procedure",
            ),
            FieldSpec::choice("specimen_laterality", LATERALITY, "side of the breast"),
            FieldSpec::text("tumor_site", "quadrant or clock position"),
            FieldSpec::text("histologic_type", "histologic type as written, e.g. invasive ductal carcinoma"),
            FieldSpec::number("tumor_size_cm", "size of the largest invasive focus in centimetres"),
            FieldSpec::choice("tumor_focality", &["single focus", "multiple foci", "cannot be determined"], "tumor focality"),
            FieldSpec::text("skin_invasion", "skin or nipple involvement, if reported"),
            FieldSpec::choice("lymphovascular_invasion", PRESENCE, "lymphovascular invasion"),
            FieldSpec::text("treatment_effect", "response to neoadjuvant therapy, e.g. residual cancer burden"),
        ],
    },
    SectionSpec {
        name: "dcis",
        instruction: "Extract ductal carcinoma in situ (DCIS) findings accompanying the invasive carcinoma.",
        fields: &[
            FieldSpec::choice("dcis_presence", &["present", "not identified"], "whether DCIS is present"),
            FieldSpec::number("dcis_size_cm", "extent of DCIS in centimetres"),
            FieldSpec::choice(
                "dcis_nuclear_grade",
                &["grade I (low)", "grade II (intermediate)", "grade III (high)"],
                "DCIS nuclear grade",
            ),
            FieldSpec::text("dcis_architectural_patterns", "architectural patterns, e.g. cribriform, solid"),
            FieldSpec::choice("dcis_necrosis", PRESENCE, "necrosis within DCIS"),
        ],
    },
    SectionSpec {
        name: "grading",
        instruction: "Extract the Nottingham histologic grade and its component scores.",
        fields: &[
            FieldSpec::integer("tubule_formation_score", "glandular/tubular differentiation score (1-3)"),
            FieldSpec::integer("nuclear_pleomorphism_score", "nuclear pleomorphism score (1-3)"),
            FieldSpec::integer("mitotic_rate_score", "mitotic rate score (1-3)"),
            FieldSpec::choice(
                "overall_grade",
                &["grade 1", "grade 2", "grade 3", "cannot be assessed"],
                "overall Nottingham grade",
            ),
        ],
    },
    staging!(
        &[
            "pTX", "pT0", "pTis", "pT1mi", "pT1a", "pT1b", "pT1c", "pT2", "pT3", "pT4a", "pT4b", "pT4c", "pT4d",
        ],
        &[
            "pNX", "pN0", "pN0(i+)", "pN1mi", "pN1a", "pN1b", "pN1c", "pN2a", "pN2b", "pN3a", "pN3b", "pN3c",
        ],
        &["not applicable", "pM1"],
    ),
    MARGINS_SECTION,
    LYMPH_NODES_SECTION,
    BIOMARKERS_SECTION,
];

// Pancreas

const PANCREAS_SECTIONS: &[SectionSpec] = &[
    SectionSpec {
        name: "nonnested",
        instruction: "Extract the primary pancreatic tumor characteristics.",
        fields: &[
            FieldSpec::choice(
                "procedure",
                &["pancreaticoduodenectomy", "distal pancreatectomy", "total pancreatectomy", "other"],
                "surgical procedure",
            ),
            FieldSpec::text("tumor_site", "head, neck, body or tail"),
            FieldSpec::text("histologic_type", "histologic type as written"),
            FieldSpec::choice("histologic_grade", GRADE_G1_G3, "histologic grade"),
            FieldSpec::number("tumor_size_cm", "greatest dimension of the tumor in centimetres"),
            FieldSpec::text("tumor_extent", "furthest structure invaded"),
            FieldSpec::choice("lymphovascular_invasion", PRESENCE, "lymphovascular invasion"),
            FieldSpec::choice("perineural_invasion", PRESENCE, "perineural invasion"),
            FieldSpec::text("treatment_effect", "response to neoadjuvant therapy"),
        ],
    },
    staging!(
        &["pTX", "pT0", "pTis", "pT1a", "pT1b", "pT1c", "pT2", "pT3", "pT4"],
        &["pNX", "pN0", "pN1", "pN2"],
        &["not applicable", "pM1"],
    ),
    MARGINS_SECTION,
    LYMPH_NODES_SECTION,
];

// Thyroid

const THYROID_SECTIONS: &[SectionSpec] = &[
    SectionSpec {
        name: "nonnested",
        instruction: "Extract the primary thyroid carcinoma characteristics.",
        fields: &[
            FieldSpec::choice(
                "procedure",
                &["lobectomy", "total thyroidectomy", "near-total thyroidectomy", "completion thyroidectomy", "other"],
                "surgical procedure",
            ),
            FieldSpec::text("tumor_site", "lobe or isthmus"),
            FieldSpec::text("histologic_type", "histologic type as written, e.g. papillary thyroid carcinoma"),
            FieldSpec::text("histologic_subtype", "subtype or variant, e.g. tall cell, follicular"),
            FieldSpec::number("tumor_size_cm", "greatest dimension of the tumor in centimetres"),
            FieldSpec::choice("tumor_focality", &["unifocal", "multifocal"], "tumor focality"),
            FieldSpec::choice(
                "extrathyroidal_extension",
                &["not identified", "microscopic", "gross into strap muscles", "gross beyond strap muscles", "cannot be determined"],
                "extrathyroidal extension",
            ),
            FieldSpec::choice(
                "angioinvasion",
                &["not identified", "focal", "extensive", "cannot be determined"],
                "vascular invasion (focal < 4 vessels, extensive >= 4 vessels)",
            ),
            FieldSpec::choice("lymphatic_invasion", PRESENCE, "lymphatic invasion"),
        ],
    },
    staging!(
        &["pTX", "pT0", "pT1a", "pT1b", "pT2", "pT3a", "pT3b", "pT4a", "pT4b"],
        &["pNX", "pN0a", "pN0b", "pN1a", "pN1b"],
        &["not applicable", "pM1"],
    ),
    MARGINS_SECTION,
    LYMPH_NODES_SECTION,
];

// Cervix

const CERVIX_SECTIONS: &[SectionSpec] = &[
    SectionSpec {
        name: "nonnested",
        instruction: "Extract the primary cervical carcinoma characteristics.",
        fields: &[
            FieldSpec::choice(
                "procedure",
                &["radical hysterectomy", "simple hysterectomy", "trachelectomy", "cone excision", "other"],
                "surgical procedure",
            ),
            FieldSpec::text("histologic_type", "histologic type as written, e.g. squamous cell carcinoma, HPV-associated"),
            FieldSpec::choice("histologic_grade", GRADE_G1_G3, "histologic grade"),
            FieldSpec::number("tumor_size_cm", "greatest dimension of the tumor in centimetres"),
            FieldSpec::number("stromal_invasion_depth_mm", "depth of stromal invasion in millimetres"),
            FieldSpec::choice("lymphovascular_invasion", PRESENCE, "lymphovascular invasion"),
            FieldSpec::choice("parametrial_involvement", PRESENCE, "parametrial involvement"),
            FieldSpec::choice("vaginal_involvement", PRESENCE, "vaginal involvement"),
        ],
    },
    SectionSpec {
        name: "staging",
        instruction: STAGING_INSTRUCTION,
        fields: &[
            FieldSpec::text("tnm_descriptors", "y, r or m prefixes if reported"),
            FieldSpec::choice(
                "pathologic_t",
                &[
                    "pTX", "pT0", "pT1a1", "pT1a2", "pT1b1", "pT1b2", "pT1b3", "pT2a1", "pT2a2", "pT2b", "pT3a", "pT3b", "pT4",
                ],
                "primary tumor category (pT)",
            ),
            FieldSpec::choice(
                "pathologic_n",
                &["pNX", "pN0", "pN0(i+)", "pN1mi", "pN1", "pN2mi", "pN2"],
                "regional lymph node category (pN)",
            ),
            FieldSpec::choice("pathologic_m", &["not applicable", "pM1"], "distant metastasis category (pM)"),
            FieldSpec::text("figo_stage", "FIGO stage if reported, e.g. IB2"),
        ],
    },
    MARGINS_SECTION,
    LYMPH_NODES_SECTION,
];

// Liver

const LIVER_NODULE_ENTRY: &[FieldSpec] = &[
    FieldSpec::text("location", "segment or lobe"),
    FieldSpec::number("size_cm", "greatest dimension in centimetres"),
];

const LIVER_SECTIONS: &[SectionSpec] = &[
    SectionSpec {
        name: "nonnested",
        instruction: "Extract the primary liver tumor characteristics.",
        fields: &[
            FieldSpec::choice(
                "procedure",
                &["wedge resection", "segmentectomy", "lobectomy", "extended hepatectomy", "total hepatectomy", "other"],
                "surgical procedure",
            ),
            FieldSpec::text("histologic_type", "histologic type as written, e.g. hepatocellular carcinoma"),
            FieldSpec::choice("histologic_grade", GRADE_G1_G4, "histologic grade"),
            FieldSpec::number("tumor_size_cm", "greatest dimension of the largest tumor in centimetres"),
            FieldSpec::text("background_liver", "fibrosis stage or cirrhosis of the non-neoplastic liver"),
            FieldSpec::text("treatment_effect", "percent necrosis after prior therapy"),
        ],
    },
    SectionSpec {
        name: "extent",
        instruction: "Extract tumor focality and extent. Emit one entry per separate tumor nodule.",
        fields: &[
            FieldSpec::choice("tumor_focality", &["solitary", "multiple"], "tumor focality"),
            FieldSpec::integer("tumor_count", "number of tumors"),
            FieldSpec::group("tumor_nodules", LIVER_NODULE_ENTRY, "one entry per tumor nodule"),
            FieldSpec::text("tumor_extent", "involvement of capsule, visceral peritoneum or adjacent organs"),
        ],
    },
    SectionSpec {
        name: "vascular_invasion",
        instruction: "Extract vascular invasion findings.",
        fields: &[
            FieldSpec::choice(
                "vascular_invasion",
                &["not identified", "small vessel", "large vessel portal vein", "large vessel hepatic vein", "cannot be determined"],
                "vascular invasion",
            ),
            FieldSpec::text("vascular_invasion_detail", "additional description as written"),
        ],
    },
    staging!(
        &["pTX", "pT0", "pT1a", "pT1b", "pT2", "pT3", "pT4"],
        &["pNX", "pN0", "pN1"],
        &["not applicable", "pM1"],
    ),
    MARGINS_SECTION,
    LYMPH_NODES_SECTION,
];

// Stomach

const STOMACH_SECTIONS: &[SectionSpec] = &[
    SectionSpec {
        name: "nonnested",
        instruction: "Extract the primary gastric tumor characteristics.",
        fields: &[
            FieldSpec::choice(
                "procedure",
                &["total gastrectomy", "subtotal gastrectomy", "proximal gastrectomy", "distal gastrectomy", "endoscopic resection", "other"],
                "surgical procedure",
            ),
            FieldSpec::text("tumor_site", "location, e.g. antrum, body, cardia"),
            FieldSpec::text("histologic_type", "histologic type as written"),
            FieldSpec::choice("lauren_classification", &["intestinal", "diffuse", "mixed", "indeterminate"], "Lauren classification"),
            FieldSpec::choice("histologic_grade", GRADE_G1_G3, "histologic grade"),
            FieldSpec::number("tumor_size_cm", "greatest dimension of the tumor in centimetres"),
            FieldSpec::text("tumor_extent", "deepest layer or structure invaded"),
            FieldSpec::choice("lymphovascular_invasion", PRESENCE, "lymphovascular invasion"),
            FieldSpec::choice("perineural_invasion", PRESENCE, "perineural invasion"),
            FieldSpec::text("treatment_effect", "response to neoadjuvant therapy"),
        ],
    },
    staging!(
        &["pTX", "pT0", "pTis", "pT1a", "pT1b", "pT2", "pT3", "pT4a", "pT4b"],
        &["pNX", "pN0", "pN1", "pN2", "pN3a", "pN3b"],
        &["not applicable", "pM1"],
    ),
    MARGINS_SECTION,
    LYMPH_NODES_SECTION,
];

pub static ALL_SCHEMAS: &[CancerSchema] = &[
    CancerSchema { cancer_type: CancerType::Stomach, sections: STOMACH_SECTIONS },
    CancerSchema { cancer_type: CancerType::Colorectal, sections: COLORECTAL_SECTIONS },
    CancerSchema { cancer_type: CancerType::Breast, sections: BREAST_SECTIONS },
    CancerSchema { cancer_type: CancerType::Esophagus, sections: ESOPHAGUS_SECTIONS },
    CancerSchema { cancer_type: CancerType::Lung, sections: LUNG_SECTIONS },
    CancerSchema { cancer_type: CancerType::Prostate, sections: PROSTATE_SECTIONS },
    CancerSchema { cancer_type: CancerType::Thyroid, sections: THYROID_SECTIONS },
    CancerSchema { cancer_type: CancerType::Pancreas, sections: PANCREAS_SECTIONS },
    CancerSchema { cancer_type: CancerType::Cervix, sections: CERVIX_SECTIONS },
    CancerSchema { cancer_type: CancerType::Liver, sections: LIVER_SECTIONS },
];
