/// A production step as listed by a house model template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HouseComponent {
    pub sequence: u32,
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HouseModel {
    pub key: &'static str,
    pub components: &'static [HouseComponent],
}

const STEEL_FRAME: HouseComponent = HouseComponent {
    sequence: 0,
    name: "Steel frame",
    description: "Weld the galvanized steel frame",
};

const WALLS: HouseComponent = HouseComponent {
    sequence: 1,
    name: "Walls",
    description: "Assemble the walls",
};

const FLOORING: HouseComponent = HouseComponent {
    sequence: 2,
    name: "Flooring",
    description: "Lay 18mm board flooring",
};

const CEILING: HouseComponent = HouseComponent {
    sequence: 3,
    name: "Ceiling",
    description: "Install the ceiling",
};

const ELECTRICAL: HouseComponent = HouseComponent {
    sequence: 4,
    name: "Electrical",
    description: "Install the electrical system",
};

const ROOF: HouseComponent = HouseComponent {
    sequence: 5,
    name: "Roof",
    description: "Install the roof",
};

const COMPACT_LINE: &[HouseComponent] = &[
    STEEL_FRAME,
    WALLS,
    FLOORING,
    CEILING,
    ELECTRICAL,
    ROOF,
    HouseComponent {
        sequence: 6,
        name: "Cleaning and QC",
        description: "Clean the unit and run the quality check",
    },
];

const SANITARY_LINE: &[HouseComponent] = &[
    STEEL_FRAME,
    WALLS,
    FLOORING,
    CEILING,
    ELECTRICAL,
    ROOF,
    HouseComponent {
        sequence: 6,
        name: "Sanitary",
        description: "Install the sanitary ware",
    },
    HouseComponent {
        sequence: 7,
        name: "Cleaning and QC",
        description: "Clean the unit and run the quality check",
    },
];

const HOUSE_MODELS: &[HouseModel] = &[
    HouseModel {
        key: "79k",
        components: COMPACT_LINE,
    },
    HouseModel {
        key: "109k",
        components: COMPACT_LINE,
    },
    HouseModel {
        key: "129k",
        components: SANITARY_LINE,
    },
    HouseModel {
        key: "139k",
        components: SANITARY_LINE,
    },
];

pub fn house_models() -> &'static [HouseModel] {
    HOUSE_MODELS
}

pub fn house_model(key: &str) -> Option<&'static HouseModel> {
    let wanted = key.trim();
    HOUSE_MODELS
        .iter()
        .find(|model| model.key.eq_ignore_ascii_case(wanted))
}
