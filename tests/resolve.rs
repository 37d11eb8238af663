use anyhow::{Context, Result};
use svd_resolver::{
  AccessSpec, Device, DimSpec, ParseOptions, Property, PropertySet, PropertyValue,
  SvdResolverError,
};

fn device(registers: &str) -> String {
  format!(
    r##"
    <device schemaVersion="1.3">
      <name>TEST</name>
      <version>1.0</version>
      <description>Test device</description>
      <addressUnitBits>8</addressUnitBits>
      <width>32</width>
      <size>32</size>
      <resetValue>0</resetValue>
      <peripherals>
        <peripheral>
          <name>UART0</name>
          <description>UART</description>
          <baseAddress>0x40000000</baseAddress>
          <interrupt>
            <name>UART0</name>
            <value>10</value>
          </interrupt>
          <registers>{}</registers>
        </peripheral>
      </peripherals>
    </device>
    "##,
    registers
  )
}

fn register_names(device: &Device, peripheral: &str) -> Result<Vec<String>> {
  let id = device.find_path(peripheral).context("no such peripheral")?;
  Ok(
    device
      .registers_of(id)
      .into_iter()
      .filter_map(|r| device.get(r).and_then(|e| e.name()).map(str::to_owned))
      .collect(),
  )
}

#[test]
fn expands_named_instances() -> Result<()> {
  let device = Device::from_xml(&device(
    r##"
    <register>
      <dim>6</dim>
      <dimIncrement>4</dimIncrement>
      <dimIndex>A,B,C,D,E,Z</dimIndex>
      <name>GPIO_%s_CTRL</name>
      <description>Port %s control</description>
      <addressOffset>0</addressOffset>
    </register>
    "##,
  ))?;

  assert_eq!(
    vec![
      "GPIO_A_CTRL",
      "GPIO_B_CTRL",
      "GPIO_C_CTRL",
      "GPIO_D_CTRL",
      "GPIO_E_CTRL",
      "GPIO_Z_CTRL"
    ],
    register_names(&device, "UART0")?
  );

  let offsets = device
    .registers_of(device.peripherals()[0])
    .into_iter()
    .map(|r| device.get(r).and_then(|e| e.as_register()).map(|r| r.address_offset))
    .collect::<Option<Vec<u32>>>()
    .context("not a register")?;
  assert_eq!(vec![0, 4, 8, 12, 16, 20], offsets);

  let z = device.find_path("UART0.GPIO_Z_CTRL").context("missing GPIO_Z_CTRL")?;
  let spec = device.get(z).and_then(|e| e.as_register()).context("not a register")?;
  assert_eq!("Port Z control", spec.description.as_ref().context("no description")?);
  assert_eq!(Some(0x4000_0014), device.address(z));

  Ok(())
}

#[test]
fn expands_fixed_size_array_once() -> Result<()> {
  let device = Device::from_xml(&device(
    r##"
    <register>
      <dim>4</dim>
      <dimIncrement>4</dimIncrement>
      <name>MyArr[%s]</name>
      <addressOffset>0x10</addressOffset>
    </register>
    "##,
  ))?;

  assert_eq!(vec!["MyArr[4]"], register_names(&device, "UART0")?);

  let id = device.find_path("UART0.MyArr[4]").context("missing array")?;
  assert_eq!(
    Some(DimSpec {
      dim: 4,
      dim_increment: 4
    }),
    device.get(id).context("no element")?.array()
  );

  Ok(())
}

#[test]
fn canonicalizes_bit_ranges() -> Result<()> {
  let device = Device::from_xml(&device(
    r##"
    <register>
      <name>CR</name>
      <addressOffset>0</addressOffset>
      <fields>
        <field><name>A</name><bitOffset>4</bitOffset></field>
        <field><name>B</name><lsb>8</lsb><msb>15</msb></field>
        <field><name>C</name><bitRange>[23:4]</bitRange></field>
      </fields>
    </register>
    "##,
  ))?;

  let range = |name: &str| -> Result<(u32, u32)> {
    let id = device
      .find_path(&format!("UART0.CR.{}", name))
      .context("missing field")?;
    let field = device.get(id).and_then(|e| e.as_field()).context("not a field")?;
    Ok((field.offset(), field.width()))
  };

  assert_eq!((4, 1), range("A")?);
  assert_eq!((8, 8), range("B")?);
  assert_eq!((4, 20), range("C")?);

  Ok(())
}

#[test]
fn field_without_bit_range_fails() {
  let result = Device::from_xml(&device(
    r##"
    <register>
      <name>CR</name>
      <addressOffset>0</addressOffset>
      <fields>
        <field><name>EN</name></field>
      </fields>
    </register>
    "##,
  ));

  match result {
    Err(SvdResolverError::MissingBitRange { field }) => assert_eq!("EN", field),
    other => panic!("unexpected result {:?}", other),
  }
}

#[test]
fn unresolved_derivation_fails() {
  let result = Device::from_xml(&device(
    r##"
    <register derivedFrom="UartCtrl0">
      <name>UartCtrl1</name>
      <addressOffset>4</addressOffset>
    </register>
    "##,
  ));

  match result {
    Err(SvdResolverError::UnresolvedDerivationSegment { path, segment }) => {
      assert_eq!("UartCtrl0", path);
      assert_eq!("UartCtrl0", segment);
    }
    other => panic!("unexpected result {:?}", other),
  }
}

#[test]
fn underived_element_has_no_source() -> Result<()> {
  let device = Device::from_xml(&device(
    "<register><name>CR</name><addressOffset>0</addressOffset></register>",
  ))?;

  let cr = device.find_path("UART0.CR").context("missing CR")?;
  assert!(device.get(cr).context("no element")?.derived_from().is_none());

  Ok(())
}

#[test]
fn flattens_double_derivation() -> Result<()> {
  let xml = device(
    r##"
    <register>
      <name>A</name>
      <description>Original</description>
      <addressOffset>0</addressOffset>
      <access>read-only</access>
      <resetValue>0x11</resetValue>
      <dataType>uint32_t</dataType>
    </register>
    <register derivedFrom="A">
      <name>B</name>
      <addressOffset>4</addressOffset>
      <access>write-only</access>
    </register>
    <register derivedFrom="B">
      <name>C</name>
      <addressOffset>8</addressOffset>
      <resetValue>0x22</resetValue>
    </register>
    "##,
  );
  let device = Device::from_xml(&xml)?;

  let a = device.find_path("UART0.A").context("missing A")?;
  let b = device.find_path("UART0.B").context("missing B")?;
  let c = device.find_path("UART0.C").context("missing C")?;
  let spec = device.get(c).and_then(|e| e.as_register()).context("not a register")?;

  assert_eq!(Some(b), device.get(c).context("no element")?.derived_from());
  assert_eq!(Some(a), device.get(b).context("no element")?.derived_from());
  assert_eq!("Original", spec.description.as_ref().context("no description")?);
  assert_eq!("uint32_t", spec.data_type.as_ref().context("no data type")?);
  assert_eq!(8, spec.address_offset);
  assert_eq!(
    Some(PropertyValue::Access(AccessSpec::WriteOnly)),
    device.resolve(c, Property::Access)
  );
  assert_eq!(
    Some(PropertyValue::ResetValue(0x22)),
    device.resolve(c, Property::ResetValue)
  );

  let again = Device::from_xml(&xml)?;
  assert_eq!(device, again);

  Ok(())
}

#[test]
fn two_segment_path_ascends_one_level() -> Result<()> {
  let xml = r##"
    <device>
      <name>TEST</name>
      <version>1.0</version>
      <description>Test device</description>
      <addressUnitBits>8</addressUnitBits>
      <width>32</width>
      <peripherals>
        <peripheral>
          <name>UART0</name>
          <baseAddress>0x40000000</baseAddress>
          <registers>
            <register>
              <name>CR</name>
              <description>Control</description>
              <addressOffset>0</addressOffset>
            </register>
          </registers>
        </peripheral>
        <peripheral>
          <name>UART1</name>
          <baseAddress>0x40001000</baseAddress>
          <registers>
            <register derivedFrom="UART0.CR">
              <name>CR</name>
            </register>
          </registers>
        </peripheral>
      </peripherals>
    </device>
  "##;
  let device = Device::from_xml(xml)?;

  let source = device.find_path("UART0.CR").context("missing UART0.CR")?;
  let cr = device.find_path("UART1.CR").context("missing UART1.CR")?;

  assert_eq!(Some(source), device.get(cr).context("no element")?.derived_from());
  assert_eq!(Some(0x4000_1000), device.address(cr));

  Ok(())
}

#[test]
fn derived_peripheral_copies_registers() -> Result<()> {
  let xml = r##"
    <device>
      <name>TEST</name>
      <version>1.0</version>
      <description>Test device</description>
      <addressUnitBits>8</addressUnitBits>
      <width>32</width>
      <peripherals>
        <peripheral>
          <name>TIMER0</name>
          <baseAddress>0x40000000</baseAddress>
          <interrupt>
            <name>TIMER0</name>
            <value>3</value>
          </interrupt>
          <registers>
            <register>
              <name>CR</name>
              <addressOffset>0</addressOffset>
              <fields>
                <field><name>EN</name><bitOffset>0</bitOffset></field>
              </fields>
            </register>
            <register>
              <name>SR</name>
              <addressOffset>4</addressOffset>
            </register>
          </registers>
        </peripheral>
        <peripheral derivedFrom="TIMER0">
          <name>TIMER1</name>
          <baseAddress>0x40000400</baseAddress>
          <registers>
            <register>
              <name>SR</name>
              <addressOffset>8</addressOffset>
            </register>
          </registers>
        </peripheral>
      </peripherals>
    </device>
  "##;
  let device = Device::from_xml(xml)?;

  assert_eq!(vec!["CR", "SR"], register_names(&device, "TIMER1")?);

  let en = device.find_path("TIMER1.CR.EN").context("missing TIMER1.CR.EN")?;
  let source_en = device.find_path("TIMER0.CR.EN").context("missing TIMER0.CR.EN")?;
  assert_ne!(en, source_en);
  assert_eq!(Some(0x4000_0400), device.address(en));

  let sr = device.find_path("TIMER1.SR").context("missing TIMER1.SR")?;
  assert_eq!(Some(0x4000_0408), device.address(sr));

  let timer1 = device.find_path("TIMER1").context("missing TIMER1")?;
  let spec = device.get(timer1).and_then(|e| e.as_peripheral()).context("not a peripheral")?;
  assert!(spec.interrupts.is_empty());

  Ok(())
}

#[test]
fn inheritance_reports_missing_property() -> Result<()> {
  let device = Device::from_xml(&device(
    r##"
    <register>
      <name>CR</name>
      <addressOffset>0</addressOffset>
    </register>
    "##,
  ))?;

  let cr = device.find_path("UART0.CR").context("missing CR")?;

  assert_eq!(Some(PropertyValue::Size(32)), device.resolve(cr, Property::Size));
  assert!(device.resolve(cr, Property::Access).is_none());
  assert_eq!(
    Some(PropertyValue::Access(AccessSpec::ReadWrite)),
    device.resolve_or_default(cr, Property::Access)
  );
  assert!(device.require(cr, Property::Access).is_err());

  Ok(())
}

#[test]
fn narrower_inheritable_set() -> Result<()> {
  let options = ParseOptions::new()
    .register_properties(PropertySet::SIZE | PropertySet::ACCESS | PropertySet::PROTECTION);
  let device = Device::from_xml_with_options(
    &device("<register><name>CR</name><addressOffset>0</addressOffset></register>"),
    &options,
  )?;

  let cr = device.find_path("UART0.CR").context("missing CR")?;

  assert_eq!(Some(PropertyValue::Size(32)), device.resolve(cr, Property::Size));
  assert!(device.resolve(cr, Property::ResetValue).is_none());

  Ok(())
}

#[test]
fn rejects_miscounted_dim_index() {
  let result = Device::from_xml(&device(
    r##"
    <register>
      <dim>3</dim>
      <dimIncrement>4</dimIncrement>
      <dimIndex>A,B</dimIndex>
      <name>R%s</name>
      <addressOffset>0</addressOffset>
    </register>
    "##,
  ));

  match result {
    Err(SvdResolverError::DimCountMismatch { dim, count, .. }) => {
      assert_eq!(3, dim);
      assert_eq!(2, count);
    }
    other => panic!("unexpected result {:?}", other),
  }
}

#[test]
fn rejects_malformed_dim_index() {
  let result = Device::from_xml(&device(
    r##"
    <register>
      <dim>2</dim>
      <dimIncrement>4</dimIncrement>
      <dimIndex>4x8</dimIndex>
      <name>R%s</name>
      <addressOffset>0</addressOffset>
    </register>
    "##,
  ));

  match result {
    Err(SvdResolverError::InvalidDimIndex { dim_index, .. }) => assert_eq!("4x8", dim_index),
    other => panic!("unexpected result {:?}", other),
  }
}

#[test]
fn requires_descriptions_when_asked() -> Result<()> {
  let xml = device("<register><name>CR</name><addressOffset>0</addressOffset></register>");

  assert!(Device::from_xml(&xml).is_ok());
  assert!(
    Device::from_xml_with_options(&xml, &ParseOptions::new().require_descriptions(true)).is_err()
  );

  Ok(())
}

#[test]
fn derived_register_without_name_fails() {
  let result = Device::from_xml(&device(
    r##"
    <register>
      <name>A</name>
      <addressOffset>0</addressOffset>
    </register>
    <register derivedFrom="A">
      <addressOffset>4</addressOffset>
    </register>
    "##,
  ));

  match result {
    Err(SvdResolverError::SchemaViolation { element, .. }) => assert_eq!("register", element),
    other => panic!("unexpected result {:?}", other),
  }
}

#[test]
fn same_named_registers_fail() {
  let result = Device::from_xml(&device(
    r##"
    <register><name>A</name><addressOffset>0</addressOffset></register>
    <register><name>A</name><addressOffset>4</addressOffset></register>
    "##,
  ));

  assert!(matches!(result, Err(SvdResolverError::SchemaViolation { .. })));
}

#[test]
fn repeated_register_past_address_space_fails() {
  let result = Device::from_xml(&device(
    r##"
    <register>
      <dim>2</dim>
      <dimIncrement>8</dimIncrement>
      <name>R%s</name>
      <addressOffset>0xFFFFFFFC</addressOffset>
    </register>
    "##,
  ));

  assert!(matches!(result, Err(SvdResolverError::SchemaViolation { .. })));
}

#[test]
fn field_past_register_bits_fails() {
  let result = Device::from_xml(&device(
    r##"
    <register>
      <name>CR</name>
      <addressOffset>0</addressOffset>
      <fields>
        <field><name>ALL</name><lsb>0</lsb><msb>0xFFFFFFFF</msb></field>
      </fields>
    </register>
    "##,
  ));

  assert!(matches!(result, Err(SvdResolverError::SchemaViolation { .. })));
}

#[test]
fn oversized_dim_range_fails_quickly() {
  let result = Device::from_xml(&device(
    r##"
    <register>
      <dim>2</dim>
      <dimIncrement>4</dimIncrement>
      <dimIndex>0-30000000</dimIndex>
      <name>R%s</name>
      <addressOffset>0</addressOffset>
    </register>
    "##,
  ));

  match result {
    Err(SvdResolverError::DimCountMismatch { dim, count, .. }) => {
      assert_eq!(2, dim);
      assert_eq!(30_000_001, count);
    }
    other => panic!("unexpected result {:?}", other),
  }
}
