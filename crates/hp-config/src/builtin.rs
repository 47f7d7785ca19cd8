//! Built-in HL7 v2 schema subset.
//!
//! Covers the segments and composite types that dominate ADT, ORU and ORM
//! traffic. Component tables list positions in order starting at 1.

pub(crate) const SEGMENTS: &[(&str, &str)] = &[
    ("MSH", "Message Header"),
    ("EVN", "Event Type"),
    ("PID", "Patient Identification"),
    ("PD1", "Patient Additional Demographic"),
    ("NK1", "Next of Kin / Associated Parties"),
    ("PV1", "Patient Visit"),
    ("PV2", "Patient Visit - Additional Information"),
    ("ORC", "Common Order"),
    ("OBR", "Observation Request"),
    ("OBX", "Observation/Result"),
    ("NTE", "Notes and Comments"),
    ("AL1", "Patient Allergy Information"),
    ("DG1", "Diagnosis"),
    ("IN1", "Insurance"),
    ("GT1", "Guarantor"),
    ("MRG", "Merge Patient Information"),
    ("SPM", "Specimen"),
    ("TQ1", "Timing/Quantity"),
];

pub(crate) const FIELDS: &[(&str, &[(&str, &str)])] = &[
    (
        "MSH",
        &[
            ("Field Separator", "ST"),
            ("Encoding Characters", "ST"),
            ("Sending Application", "HD"),
            ("Sending Facility", "HD"),
            ("Receiving Application", "HD"),
            ("Receiving Facility", "HD"),
            ("Date/Time of Message", "TS"),
            ("Security", "ST"),
            ("Message Type", "MSG"),
            ("Message Control ID", "ST"),
            ("Processing ID", "PT"),
            ("Version ID", "VID"),
            ("Sequence Number", "NM"),
            ("Continuation Pointer", "ST"),
            ("Accept Acknowledgment Type", "ID"),
            ("Application Acknowledgment Type", "ID"),
            ("Country Code", "ID"),
            ("Character Set", "ID"),
            ("Principal Language of Message", "CE"),
            ("Alternate Character Set Handling Scheme", "ID"),
            ("Message Profile Identifier", "EI"),
        ],
    ),
    (
        "EVN",
        &[
            ("Event Type Code", "ID"),
            ("Recorded Date/Time", "TS"),
            ("Date/Time Planned Event", "TS"),
            ("Event Reason Code", "IS"),
            ("Operator ID", "XCN"),
            ("Event Occurred", "TS"),
            ("Event Facility", "HD"),
        ],
    ),
    (
        "PID",
        &[
            ("Set ID - PID", "SI"),
            ("Patient ID", "CX"),
            ("Patient Identifier List", "CX"),
            ("Alternate Patient ID - PID", "CX"),
            ("Patient Name", "XPN"),
            ("Mother's Maiden Name", "XPN"),
            ("Date/Time of Birth", "TS"),
            ("Administrative Sex", "IS"),
            ("Patient Alias", "XPN"),
            ("Race", "CE"),
            ("Patient Address", "XAD"),
            ("County Code", "IS"),
            ("Phone Number - Home", "XTN"),
            ("Phone Number - Business", "XTN"),
            ("Primary Language", "CE"),
            ("Marital Status", "CE"),
            ("Religion", "CE"),
            ("Patient Account Number", "CX"),
            ("SSN Number - Patient", "ST"),
            ("Driver's License Number - Patient", "DLN"),
            ("Mother's Identifier", "CX"),
            ("Ethnic Group", "CE"),
            ("Birth Place", "ST"),
            ("Multiple Birth Indicator", "ID"),
            ("Birth Order", "NM"),
            ("Citizenship", "CE"),
            ("Veterans Military Status", "CE"),
            ("Nationality", "CE"),
            ("Patient Death Date and Time", "TS"),
            ("Patient Death Indicator", "ID"),
        ],
    ),
    (
        "PD1",
        &[
            ("Living Dependency", "IS"),
            ("Living Arrangement", "IS"),
            ("Patient Primary Facility", "XON"),
            ("Patient Primary Care Provider Name & ID No.", "XCN"),
            ("Student Indicator", "IS"),
            ("Handicap", "IS"),
            ("Living Will Code", "IS"),
            ("Organ Donor Code", "IS"),
        ],
    ),
    (
        "NK1",
        &[
            ("Set ID - NK1", "SI"),
            ("Name", "XPN"),
            ("Relationship", "CE"),
            ("Address", "XAD"),
            ("Phone Number", "XTN"),
            ("Business Phone Number", "XTN"),
            ("Contact Role", "CE"),
            ("Start Date", "DT"),
            ("End Date", "DT"),
        ],
    ),
    (
        "PV1",
        &[
            ("Set ID - PV1", "SI"),
            ("Patient Class", "IS"),
            ("Assigned Patient Location", "PL"),
            ("Admission Type", "IS"),
            ("Preadmit Number", "CX"),
            ("Prior Patient Location", "PL"),
            ("Attending Doctor", "XCN"),
            ("Referring Doctor", "XCN"),
            ("Consulting Doctor", "XCN"),
            ("Hospital Service", "IS"),
            ("Temporary Location", "PL"),
            ("Preadmit Test Indicator", "IS"),
            ("Re-admission Indicator", "IS"),
            ("Admit Source", "IS"),
            ("Ambulatory Status", "IS"),
            ("VIP Indicator", "IS"),
            ("Admitting Doctor", "XCN"),
            ("Patient Type", "IS"),
            ("Visit Number", "CX"),
            ("Financial Class", "FC"),
        ],
    ),
    (
        "PV2",
        &[
            ("Prior Pending Location", "PL"),
            ("Accommodation Code", "CE"),
            ("Admit Reason", "CE"),
            ("Transfer Reason", "CE"),
            ("Patient Valuables", "ST"),
            ("Patient Valuables Location", "ST"),
            ("Visit User Code", "IS"),
            ("Expected Admit Date/Time", "TS"),
            ("Expected Discharge Date/Time", "TS"),
        ],
    ),
    (
        "ORC",
        &[
            ("Order Control", "ID"),
            ("Placer Order Number", "EI"),
            ("Filler Order Number", "EI"),
            ("Placer Group Number", "EI"),
            ("Order Status", "ID"),
            ("Response Flag", "ID"),
            ("Quantity/Timing", "ST"),
            ("Parent", "EIP"),
            ("Date/Time of Transaction", "TS"),
            ("Entered By", "XCN"),
            ("Verified By", "XCN"),
            ("Ordering Provider", "XCN"),
        ],
    ),
    (
        "OBR",
        &[
            ("Set ID - OBR", "SI"),
            ("Placer Order Number", "EI"),
            ("Filler Order Number", "EI"),
            ("Universal Service Identifier", "CE"),
            ("Priority - OBR", "ID"),
            ("Requested Date/Time", "TS"),
            ("Observation Date/Time", "TS"),
            ("Observation End Date/Time", "TS"),
            ("Collection Volume", "CQ"),
            ("Collector Identifier", "XCN"),
            ("Specimen Action Code", "ID"),
            ("Danger Code", "CE"),
            ("Relevant Clinical Information", "ST"),
            ("Specimen Received Date/Time", "TS"),
            ("Specimen Source", "ST"),
            ("Ordering Provider", "XCN"),
            ("Order Callback Phone Number", "XTN"),
            ("Placer Field 1", "ST"),
            ("Placer Field 2", "ST"),
            ("Filler Field 1", "ST"),
            ("Filler Field 2", "ST"),
            ("Results Rpt/Status Chng - Date/Time", "TS"),
            ("Charge to Practice", "ST"),
            ("Diagnostic Serv Sect ID", "ID"),
            ("Result Status", "ID"),
        ],
    ),
    (
        "OBX",
        &[
            ("Set ID - OBX", "SI"),
            ("Value Type", "ID"),
            ("Observation Identifier", "CE"),
            ("Observation Sub-ID", "ST"),
            ("Observation Value", "ST"),
            ("Units", "CE"),
            ("References Range", "ST"),
            ("Abnormal Flags", "IS"),
            ("Probability", "NM"),
            ("Nature of Abnormal Test", "ID"),
            ("Observation Result Status", "ID"),
            ("Effective Date of Reference Range", "TS"),
            ("User Defined Access Checks", "ST"),
            ("Date/Time of the Observation", "TS"),
            ("Producer's ID", "CE"),
            ("Responsible Observer", "XCN"),
            ("Observation Method", "CE"),
            ("Equipment Instance Identifier", "EI"),
            ("Date/Time of the Analysis", "TS"),
        ],
    ),
    (
        "NTE",
        &[
            ("Set ID - NTE", "SI"),
            ("Source of Comment", "ID"),
            ("Comment", "FT"),
            ("Comment Type", "CE"),
        ],
    ),
    (
        "AL1",
        &[
            ("Set ID - AL1", "SI"),
            ("Allergen Type Code", "CE"),
            ("Allergen Code/Mnemonic/Description", "CE"),
            ("Allergy Severity Code", "CE"),
            ("Allergy Reaction Code", "ST"),
            ("Identification Date", "DT"),
        ],
    ),
    (
        "DG1",
        &[
            ("Set ID - DG1", "SI"),
            ("Diagnosis Coding Method", "ID"),
            ("Diagnosis Code - DG1", "CE"),
            ("Diagnosis Description", "ST"),
            ("Diagnosis Date/Time", "TS"),
            ("Diagnosis Type", "IS"),
        ],
    ),
    (
        "IN1",
        &[
            ("Set ID - IN1", "SI"),
            ("Insurance Plan ID", "CE"),
            ("Insurance Company ID", "CX"),
            ("Insurance Company Name", "XON"),
            ("Insurance Company Address", "XAD"),
            ("Insurance Co Contact Person", "XPN"),
            ("Insurance Co Phone Number", "XTN"),
            ("Group Number", "ST"),
            ("Group Name", "XON"),
            ("Insured's Group Emp ID", "CX"),
            ("Insured's Group Emp Name", "XON"),
            ("Plan Effective Date", "DT"),
            ("Plan Expiration Date", "DT"),
            ("Authorization Information", "ST"),
            ("Plan Type", "IS"),
            ("Name of Insured", "XPN"),
            ("Insured's Relationship to Patient", "CE"),
            ("Insured's Date of Birth", "TS"),
            ("Insured's Address", "XAD"),
        ],
    ),
    (
        "GT1",
        &[
            ("Set ID - GT1", "SI"),
            ("Guarantor Number", "CX"),
            ("Guarantor Name", "XPN"),
            ("Guarantor Spouse Name", "XPN"),
            ("Guarantor Address", "XAD"),
            ("Guarantor Ph Num - Home", "XTN"),
            ("Guarantor Ph Num - Business", "XTN"),
            ("Guarantor Date/Time of Birth", "TS"),
            ("Guarantor Administrative Sex", "IS"),
            ("Guarantor Type", "IS"),
            ("Guarantor Relationship", "CE"),
            ("Guarantor SSN", "ST"),
        ],
    ),
    (
        "MRG",
        &[
            ("Prior Patient Identifier List", "CX"),
            ("Prior Alternate Patient ID", "CX"),
            ("Prior Patient Account Number", "CX"),
            ("Prior Patient ID", "CX"),
            ("Prior Visit Number", "CX"),
            ("Prior Alternate Visit ID", "CX"),
            ("Prior Patient Name", "XPN"),
        ],
    ),
    (
        "SPM",
        &[
            ("Set ID - SPM", "SI"),
            ("Specimen ID", "EIP"),
            ("Specimen Parent IDs", "EIP"),
            ("Specimen Type", "CWE"),
            ("Specimen Type Modifier", "CWE"),
            ("Specimen Additives", "CWE"),
            ("Specimen Collection Method", "CWE"),
            ("Specimen Source Site", "CWE"),
            ("Specimen Source Site Modifier", "CWE"),
            ("Specimen Collection Site", "CWE"),
            ("Specimen Role", "CWE"),
            ("Specimen Collection Amount", "CQ"),
        ],
    ),
    (
        "TQ1",
        &[
            ("Set ID - TQ1", "SI"),
            ("Quantity", "CQ"),
            ("Repeat Pattern", "ST"),
            ("Explicit Time", "TM"),
            ("Relative Time and Units", "CQ"),
            ("Service Duration", "CQ"),
            ("Start date/time", "TS"),
            ("End date/time", "TS"),
            ("Priority", "CWE"),
        ],
    ),
];

pub(crate) const DATATYPES: &[(&str, &[(&str, &str)])] = &[
    (
        "HD",
        &[
            ("Namespace ID", "IS"),
            ("Universal ID", "ST"),
            ("Universal ID Type", "ID"),
        ],
    ),
    (
        "MSG",
        &[
            ("Message Code", "ID"),
            ("Trigger Event", "ID"),
            ("Message Structure", "ID"),
        ],
    ),
    ("PT", &[("Processing ID", "ID"), ("Processing Mode", "ID")]),
    (
        "VID",
        &[
            ("Version ID", "ID"),
            ("Internationalization Code", "CE"),
            ("International Version ID", "CE"),
        ],
    ),
    (
        "CE",
        &[
            ("Identifier", "ST"),
            ("Text", "ST"),
            ("Name of Coding System", "ID"),
            ("Alternate Identifier", "ST"),
            ("Alternate Text", "ST"),
            ("Name of Alternate Coding System", "ID"),
        ],
    ),
    (
        "CWE",
        &[
            ("Identifier", "ST"),
            ("Text", "ST"),
            ("Name of Coding System", "ID"),
            ("Alternate Identifier", "ST"),
            ("Alternate Text", "ST"),
            ("Name of Alternate Coding System", "ID"),
            ("Coding System Version ID", "ST"),
            ("Alternate Coding System Version ID", "ST"),
            ("Original Text", "ST"),
        ],
    ),
    (
        "EI",
        &[
            ("Entity Identifier", "ST"),
            ("Namespace ID", "IS"),
            ("Universal ID", "ST"),
            ("Universal ID Type", "ID"),
        ],
    ),
    (
        "EIP",
        &[
            ("Placer Assigned Identifier", "EI"),
            ("Filler Assigned Identifier", "EI"),
        ],
    ),
    (
        "CX",
        &[
            ("ID Number", "ST"),
            ("Check Digit", "ST"),
            ("Check Digit Scheme", "ID"),
            ("Assigning Authority", "HD"),
            ("Identifier Type Code", "ID"),
            ("Assigning Facility", "HD"),
            ("Effective Date", "DT"),
            ("Expiration Date", "DT"),
        ],
    ),
    (
        "FN",
        &[
            ("Surname", "ST"),
            ("Own Surname Prefix", "ST"),
            ("Own Surname", "ST"),
            ("Surname Prefix From Partner/Spouse", "ST"),
            ("Surname From Partner/Spouse", "ST"),
        ],
    ),
    (
        "XPN",
        &[
            ("Family Name", "FN"),
            ("Given Name", "ST"),
            ("Second and Further Given Names or Initials Thereof", "ST"),
            ("Suffix", "ST"),
            ("Prefix", "ST"),
            ("Degree", "IS"),
            ("Name Type Code", "ID"),
        ],
    ),
    (
        "SAD",
        &[
            ("Street or Mailing Address", "ST"),
            ("Street Name", "ST"),
            ("Dwelling Number", "ST"),
        ],
    ),
    (
        "XAD",
        &[
            ("Street Address", "SAD"),
            ("Other Designation", "ST"),
            ("City", "ST"),
            ("State or Province", "ST"),
            ("Zip or Postal Code", "ST"),
            ("Country", "ID"),
            ("Address Type", "ID"),
            ("Other Geographic Designation", "ST"),
            ("County/Parish Code", "IS"),
        ],
    ),
    (
        "XTN",
        &[
            ("Telephone Number", "ST"),
            ("Telecommunication Use Code", "ID"),
            ("Telecommunication Equipment Type", "ID"),
            ("Email Address", "ST"),
            ("Country Code", "NM"),
            ("Area/City Code", "NM"),
            ("Local Number", "NM"),
            ("Extension", "NM"),
            ("Any Text", "ST"),
        ],
    ),
    (
        "XCN",
        &[
            ("ID Number", "ST"),
            ("Family Name", "FN"),
            ("Given Name", "ST"),
            ("Second and Further Given Names or Initials Thereof", "ST"),
            ("Suffix", "ST"),
            ("Prefix", "ST"),
            ("Degree", "IS"),
            ("Source Table", "IS"),
            ("Assigning Authority", "HD"),
        ],
    ),
    (
        "XON",
        &[
            ("Organization Name", "ST"),
            ("Organization Name Type Code", "IS"),
            ("ID Number", "NM"),
            ("Check Digit", "NM"),
            ("Check Digit Scheme", "ID"),
            ("Assigning Authority", "HD"),
        ],
    ),
    (
        "PL",
        &[
            ("Point of Care", "IS"),
            ("Room", "IS"),
            ("Bed", "IS"),
            ("Facility", "HD"),
            ("Location Status", "IS"),
            ("Person Location Type", "IS"),
            ("Building", "IS"),
            ("Floor", "IS"),
        ],
    ),
    ("CQ", &[("Quantity", "NM"), ("Units", "CE")]),
    (
        "DLN",
        &[
            ("License Number", "ST"),
            ("Issuing State, Province, Country", "IS"),
            ("Expiration Date", "DT"),
        ],
    ),
    ("FC", &[("Financial Class Code", "IS"), ("Effective Date", "TS")]),
];
