//! Summary of a whole data object, and the reduction that combines the
//! summaries of several parts or processes into one.

use meshstat_common::{Result, error::Error};
use meshstat_format::{DataObjectType, FieldAssociation, MessageReader, MessageWriter};
use meshstat_model::{
    DataBody, DataObject, DataSet, ForeignObject, GenericDataSet, Graph, PipelineMetadata,
    Selection, Table,
};

use crate::{
    array::ArrayStatistics,
    attributes::AttributeSetStatistics,
    bounds::{Bounds, Extent},
    composite::CompositeTreeStatistics,
    helpers::HelperRegistry,
};

const EMPTY_TIME_SPAN: [f64; 2] = [f64::INFINITY, f64::NEG_INFINITY];

/// Counts, geometry, attribute statistics, composite structure and time
/// metadata of one data object.
///
/// Summaries built on different processes are combined with
/// [`add_information`](Self::add_information). `port_number` is local and is
/// not part of the stream.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetStatistics {
    data_class_name: Option<String>,
    data_set_type: Option<DataObjectType>,
    composite_class_name: Option<String>,
    composite_type: Option<DataObjectType>,
    composite_block_name: Option<String>,
    num_data_sets: i32,
    num_points: i64,
    num_cells: i64,
    num_rows: i64,
    memory_size: i64,
    polygon_count: i64,
    bounds: Bounds,
    extent: Extent,
    point_data: AttributeSetStatistics,
    cell_data: AttributeSetStatistics,
    field_data: AttributeSetStatistics,
    vertex_data: AttributeSetStatistics,
    edge_data: AttributeSetStatistics,
    row_data: AttributeSetStatistics,
    point_array: ArrayStatistics,
    composite_info: Option<CompositeTreeStatistics>,
    time_span: [f64; 2],
    has_time: bool,
    time: f64,
    num_time_steps: i32,
    time_label: Option<String>,
    port_number: i32,
}

impl Default for DatasetStatistics {
    fn default() -> Self {
        DatasetStatistics {
            data_class_name: None,
            data_set_type: None,
            composite_class_name: None,
            composite_type: None,
            composite_block_name: None,
            num_data_sets: 0,
            num_points: 0,
            num_cells: 0,
            num_rows: 0,
            memory_size: 0,
            polygon_count: 0,
            bounds: Bounds::EMPTY,
            extent: Extent::EMPTY,
            point_data: AttributeSetStatistics::new(FieldAssociation::Points),
            cell_data: AttributeSetStatistics::new(FieldAssociation::Cells),
            field_data: AttributeSetStatistics::new(FieldAssociation::Field),
            vertex_data: AttributeSetStatistics::new(FieldAssociation::Vertices),
            edge_data: AttributeSetStatistics::new(FieldAssociation::Edges),
            row_data: AttributeSetStatistics::new(FieldAssociation::Rows),
            point_array: ArrayStatistics::new(),
            composite_info: None,
            time_span: EMPTY_TIME_SPAN,
            has_time: false,
            time: 0.0,
            num_time_steps: 0,
            time_label: None,
            port_number: -1,
        }
    }
}

impl DatasetStatistics {
    pub fn new() -> DatasetStatistics {
        DatasetStatistics::default()
    }

    /// Summarizes `object` without any foreign-type helpers.
    pub fn from_object(object: &DataObject) -> DatasetStatistics {
        DatasetStatistics::from_object_with(object, &HelperRegistry::default())
    }

    pub fn from_object_with(object: &DataObject, helpers: &HelperRegistry) -> DatasetStatistics {
        let mut info = DatasetStatistics::new();
        info.copy_from_object_with(object, helpers);
        info
    }

    pub fn from_data_set(data_set: &DataSet) -> DatasetStatistics {
        let mut info = DatasetStatistics::new();
        info.copy_from_data_set(data_set);
        info
    }

    /// Resets every field except the port number.
    pub fn initialize(&mut self) {
        let port_number = self.port_number;
        *self = DatasetStatistics {
            port_number,
            ..DatasetStatistics::default()
        };
    }

    /// `true` while nothing has been recorded: no points, cells, data sets or
    /// field data.
    pub fn is_uninitialized(&self) -> bool {
        self.num_points == 0
            && self.num_cells == 0
            && self.num_data_sets == 0
            && self.field_data.is_empty()
    }

    pub fn data_class_name(&self) -> Option<&str> {
        self.data_class_name.as_deref()
    }

    pub fn set_data_class_name(&mut self, name: Option<&str>) {
        self.data_class_name = name.map(str::to_string);
    }

    pub fn data_set_type(&self) -> Option<DataObjectType> {
        self.data_set_type
    }

    pub fn set_data_set_type(&mut self, ty: Option<DataObjectType>) {
        self.data_set_type = ty;
    }

    pub fn composite_class_name(&self) -> Option<&str> {
        self.composite_class_name.as_deref()
    }

    pub fn composite_type(&self) -> Option<DataObjectType> {
        self.composite_type
    }

    pub fn composite_block_name(&self) -> Option<&str> {
        self.composite_block_name.as_deref()
    }

    pub fn set_composite_block_name(&mut self, name: Option<&str>) {
        self.composite_block_name = name.map(str::to_string);
    }

    pub fn is_composite(&self) -> bool {
        self.composite_info
            .as_ref()
            .is_some_and(CompositeTreeStatistics::is_composite)
    }

    pub fn composite_info(&self) -> Option<&CompositeTreeStatistics> {
        self.composite_info.as_ref()
    }

    pub fn set_composite_info(&mut self, info: Option<CompositeTreeStatistics>) {
        self.composite_info = info;
    }

    pub fn num_data_sets(&self) -> i32 {
        self.num_data_sets
    }

    pub fn set_num_data_sets(&mut self, count: i32) {
        self.num_data_sets = count;
    }

    pub fn num_points(&self) -> i64 {
        self.num_points
    }

    pub fn set_num_points(&mut self, count: i64) {
        self.num_points = count;
    }

    pub fn num_cells(&self) -> i64 {
        self.num_cells
    }

    pub fn set_num_cells(&mut self, count: i64) {
        self.num_cells = count;
    }

    pub fn num_rows(&self) -> i64 {
        self.num_rows
    }

    pub fn set_num_rows(&mut self, count: i64) {
        self.num_rows = count;
    }

    /// Approximate in-memory footprint, in bytes.
    pub fn memory_size(&self) -> i64 {
        self.memory_size
    }

    pub fn set_memory_size(&mut self, bytes: i64) {
        self.memory_size = bytes;
    }

    pub fn polygon_count(&self) -> i64 {
        self.polygon_count
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn set_extent(&mut self, extent: Extent) {
        self.extent = extent;
    }

    pub fn point_data(&self) -> &AttributeSetStatistics {
        &self.point_data
    }

    pub fn cell_data(&self) -> &AttributeSetStatistics {
        &self.cell_data
    }

    pub fn field_data(&self) -> &AttributeSetStatistics {
        &self.field_data
    }

    pub fn vertex_data(&self) -> &AttributeSetStatistics {
        &self.vertex_data
    }

    pub fn edge_data(&self) -> &AttributeSetStatistics {
        &self.edge_data
    }

    pub fn row_data(&self) -> &AttributeSetStatistics {
        &self.row_data
    }

    pub fn attribute_set(&self, association: FieldAssociation) -> &AttributeSetStatistics {
        match association {
            FieldAssociation::Points => &self.point_data,
            FieldAssociation::Cells => &self.cell_data,
            FieldAssociation::Field => &self.field_data,
            FieldAssociation::Vertices => &self.vertex_data,
            FieldAssociation::Edges => &self.edge_data,
            FieldAssociation::Rows => &self.row_data,
        }
    }

    pub fn attribute_set_mut(
        &mut self,
        association: FieldAssociation,
    ) -> &mut AttributeSetStatistics {
        match association {
            FieldAssociation::Points => &mut self.point_data,
            FieldAssociation::Cells => &mut self.cell_data,
            FieldAssociation::Field => &mut self.field_data,
            FieldAssociation::Vertices => &mut self.vertex_data,
            FieldAssociation::Edges => &mut self.edge_data,
            FieldAssociation::Rows => &mut self.row_data,
        }
    }

    pub fn array_information(
        &self,
        association: FieldAssociation,
        name: &str,
    ) -> Option<&ArrayStatistics> {
        self.attribute_set(association).array_information(name)
    }

    /// Statistics of the point coordinates (explicit point sets only).
    pub fn point_array_information(&self) -> &ArrayStatistics {
        &self.point_array
    }

    pub fn time_span(&self) -> [f64; 2] {
        self.time_span
    }

    pub fn has_time(&self) -> bool {
        self.has_time
    }

    /// Current time, when [`has_time`](Self::has_time) is set.
    pub fn time(&self) -> Option<f64> {
        self.has_time.then_some(self.time)
    }

    pub fn num_time_steps(&self) -> i32 {
        self.num_time_steps
    }

    pub fn time_label(&self) -> Option<&str> {
        self.time_label.as_deref()
    }

    /// Applies pipeline time metadata. Absent entries leave the current values.
    pub fn set_time_metadata(&mut self, metadata: &PipelineMetadata) {
        if let Some(range) = metadata.time_range {
            self.time_span = range;
        } else if let (Some(first), Some(last)) =
            (metadata.time_steps.first(), metadata.time_steps.last())
        {
            self.time_span = [*first, *last];
        }
        if !metadata.time_steps.is_empty() {
            self.num_time_steps = metadata.time_steps.len() as i32;
        }
        if let Some(time) = metadata.current_time {
            self.has_time = true;
            self.time = time;
        }
        if metadata.time_label.is_some() {
            self.time_label.clone_from(&metadata.time_label);
        }
    }

    /// Output port to summarize; `-1` selects the first output.
    pub fn port_number(&self) -> i32 {
        self.port_number
    }

    pub fn set_port_number(&mut self, port: i32) {
        self.port_number = port;
    }

    /// Summarizes the output selected by the port number.
    pub fn copy_from_outputs(&mut self, outputs: &[DataObject], helpers: &HelperRegistry) {
        let port = if self.port_number < 0 { 0 } else { self.port_number as usize };
        match outputs.get(port) {
            Some(object) => self.copy_from_object_with(object, helpers),
            None => {
                log::warn!(
                    "output port {port} requested, but only {} outputs exist",
                    outputs.len()
                );
                self.initialize();
            }
        }
    }

    pub fn copy_from_object(&mut self, object: &DataObject) {
        self.copy_from_object_with(object, &HelperRegistry::default());
    }

    /// Rebuilds the summary from a live object. Foreign objects are handed to
    /// the helper registered for their type name.
    pub fn copy_from_object_with(&mut self, object: &DataObject, helpers: &HelperRegistry) {
        self.initialize();
        match &object.body {
            DataBody::DataSet(data_set) => self.copy_from_data_set(data_set),
            DataBody::Composite(_) | DataBody::Amr(_) => self.copy_from_composite(object, helpers),
            DataBody::Generic(generic) => self.copy_from_generic(generic),
            DataBody::Graph(graph) => self.copy_from_graph(graph),
            DataBody::Table(table) => self.copy_from_table(table),
            DataBody::Selection(selection) => self.copy_from_selection(selection),
            DataBody::Foreign(foreign) => {
                self.copy_common_metadata(object);
                self.copy_from_foreign(foreign, helpers);
                return;
            }
        }
        self.copy_common_metadata(object);
    }

    fn copy_common_metadata(&mut self, object: &DataObject) {
        if object.is_composite() {
            let mut own = AttributeSetStatistics::new(FieldAssociation::Field);
            own.copy_from_data_set_attributes(&object.field_data);
            self.field_data.add_information(&own);
        } else {
            self.field_data
                .copy_from_data_set_attributes(&object.field_data);
        }
        self.memory_size += object.field_data.memory_size() as i64;
        self.set_time_metadata(&object.metadata);
    }

    fn set_data_type(&mut self, ty: DataObjectType) {
        self.data_class_name = Some(ty.class_name().to_string());
        self.data_set_type = Some(ty);
    }

    fn copy_from_data_set(&mut self, data_set: &DataSet) {
        self.set_data_type(data_set.data_object_type());
        self.num_data_sets = 1;
        if let Some(extent) = data_set.extent() {
            self.extent = Extent(extent);
        }
        self.num_points = data_set.num_points() as i64;
        if self.num_points == 0 {
            return;
        }
        self.num_cells = data_set.num_cells() as i64;
        self.bounds = Bounds(data_set.bounds());
        self.memory_size = data_set.memory_size() as i64;
        if matches!(
            data_set.data_object_type(),
            DataObjectType::PolyData | DataObjectType::UnstructuredGrid
        ) {
            self.polygon_count = self.num_cells;
        }
        if let Some(points) = data_set.points() {
            if let Err(e) = self.point_array.copy_from_object(Some(points)) {
                log::warn!("point coordinates: {e}");
            }
        }
        self.point_data
            .copy_from_data_set_attributes(&data_set.point_data);
        self.cell_data.copy_from_data_set_attributes(&data_set.cell_data);
    }

    fn copy_from_generic(&mut self, generic: &GenericDataSet) {
        self.set_data_type(DataObjectType::GenericDataSet);
        self.num_data_sets = 1;
        self.num_points = generic.num_points as i64;
        if self.num_points == 0 {
            return;
        }
        self.num_cells = generic.num_cells as i64;
        self.bounds = Bounds(generic.bounds());
        self.memory_size = generic.memory_size() as i64;
        self.point_data
            .copy_from_data_set_attributes(&generic.point_data);
        self.cell_data.copy_from_data_set_attributes(&generic.cell_data);
    }

    fn copy_from_graph(&mut self, graph: &Graph) {
        self.set_data_type(graph.data_object_type());
        self.num_data_sets = 1;
        self.num_points = graph.num_vertices as i64;
        self.num_cells = graph.num_edges as i64;
        self.bounds = Bounds(graph.bounds());
        self.memory_size = graph.memory_size() as i64;
        if let Some(points) = &graph.points {
            if let Err(e) = self.point_array.copy_from_object(Some(points)) {
                log::warn!("graph vertex coordinates: {e}");
            }
        }
        self.vertex_data
            .copy_from_data_set_attributes(&graph.vertex_data);
        self.edge_data.copy_from_data_set_attributes(&graph.edge_data);
    }

    fn copy_from_table(&mut self, table: &Table) {
        self.set_data_type(DataObjectType::Table);
        self.num_data_sets = 1;
        self.num_rows = table.num_rows() as i64;
        self.num_cells = (table.num_rows() * table.num_columns()) as i64;
        self.memory_size = table.memory_size() as i64;
        self.row_data.copy_from_data_set_attributes(&table.row_data);
    }

    fn copy_from_selection(&mut self, selection: &Selection) {
        self.set_data_type(DataObjectType::Selection);
        self.num_data_sets = 1;
        self.memory_size = selection.memory_size() as i64;
    }

    fn copy_from_composite(&mut self, object: &DataObject, helpers: &HelperRegistry) {
        let mut tree = CompositeTreeStatistics::new();
        tree.copy_from_object(object, helpers);

        match &object.body {
            DataBody::Composite(composite) => {
                for leaf in composite.leaves() {
                    let leaf_info = DatasetStatistics::from_object_with(leaf, helpers);
                    self.add_information(&leaf_info, true);
                }
            }
            DataBody::Amr(amr) => {
                for data_set in amr.levels().flatten().flatten() {
                    self.add_information(&DatasetStatistics::from_data_set(data_set), true);
                }
            }
            _ => {}
        }

        self.composite_info = Some(tree);
        self.composite_class_name = Some(object.class_name().to_string());
        self.composite_type = object.data_object_type();
    }

    fn copy_from_foreign(&mut self, foreign: &ForeignObject, helpers: &HelperRegistry) {
        self.data_class_name = Some(foreign.type_name.clone());
        let Some(helper) = helpers.get(&foreign.type_name) else {
            let e = Error::cast("registered data information helper", &foreign.type_name);
            log::warn!("{e}");
            return;
        };
        if let Err(e) = helper.copy_to(foreign.payload.as_ref(), self) {
            log::warn!("helper for {:?} failed: {e}", foreign.type_name);
            self.initialize();
            self.data_class_name = Some(foreign.type_name.clone());
        }
    }

    /// Replaces this summary with a copy of `other`, keeping the port number.
    /// Without `copy_composite` this summary's composite identity and tree are
    /// kept as well.
    pub fn deep_copy(&mut self, other: &DatasetStatistics, copy_composite: bool) {
        let port_number = self.port_number;
        if copy_composite {
            self.clone_from(other);
        } else {
            let class_name = self.composite_class_name.take();
            let composite_type = self.composite_type.take();
            let block_name = self.composite_block_name.take();
            let composite_info = self.composite_info.take();
            self.clone_from(other);
            self.composite_class_name = class_name;
            self.composite_type = composite_type;
            self.composite_block_name = block_name;
            self.composite_info = composite_info;
        }
        self.port_number = port_number;
    }

    /// Folds `other` into this summary.
    ///
    /// With `adding_parts` the two summaries describe sibling parts of one
    /// object and their data set counts add up. Otherwise they describe the
    /// same part as seen by different processes: the composite identity and
    /// tree are merged first, and data set counts take the maximum unless this
    /// summary describes a composite.
    pub fn add_information(&mut self, other: &DatasetStatistics, adding_parts: bool) {
        if !adding_parts {
            if self.composite_class_name.is_none() {
                self.composite_class_name.clone_from(&other.composite_class_name);
            }
            if self.composite_type.is_none() {
                self.composite_type = other.composite_type;
            }
            if let Some(theirs) = &other.composite_info {
                self.composite_info
                    .get_or_insert_with(CompositeTreeStatistics::new)
                    .add_information(theirs);
            }
        }

        if other.num_data_sets == 0 {
            return;
        }
        if self.is_uninitialized() {
            self.deep_copy(other, !adding_parts);
            return;
        }

        let promoted = DataObjectType::promote(self.data_set_type, other.data_set_type);
        if promoted != self.data_set_type {
            if self.data_set_type.is_some() {
                if let Some(ty) = promoted {
                    self.data_class_name = Some(ty.class_name().to_string());
                }
            } else {
                self.data_class_name.clone_from(&other.data_class_name);
            }
            self.data_set_type = promoted;
        }

        if other.num_cells == 0 && other.num_points == 0 {
            return;
        }

        if self.data_set_type == Some(DataObjectType::PolyData) {
            self.polygon_count += other.polygon_count;
        }

        if adding_parts || self.composite_class_name.is_some() {
            self.num_data_sets += other.num_data_sets;
        } else {
            self.num_data_sets = self.num_data_sets.max(other.num_data_sets);
        }

        self.bounds.add(&other.bounds);

        if other.extent.is_valid() {
            if self.extent.is_valid() {
                self.extent.add(&other.extent);
            } else {
                self.extent = other.extent;
            }
        }

        let points = (self.num_points > 0, other.num_points > 0);
        let cells = (self.num_cells > 0, other.num_cells > 0);
        let rows = (self.num_rows > 0, other.num_rows > 0);
        merge_attribute_set(&mut self.point_data, &other.point_data, points, adding_parts);
        merge_attribute_set(&mut self.vertex_data, &other.vertex_data, points, adding_parts);
        merge_attribute_set(&mut self.cell_data, &other.cell_data, cells, adding_parts);
        merge_attribute_set(&mut self.edge_data, &other.edge_data, cells, adding_parts);
        merge_attribute_set(&mut self.row_data, &other.row_data, rows, adding_parts);
        self.field_data.add_information(&other.field_data);
        match points {
            (true, true) => self.point_array.add_information(&other.point_array),
            (false, true) => self.point_array.deep_copy(&other.point_array),
            _ => {}
        }

        self.num_points += other.num_points;
        self.num_cells += other.num_cells;
        self.memory_size += other.memory_size;
        self.num_rows += other.num_rows;
        self.time_span[0] = self.time_span[0].min(other.time_span[0]);
        self.time_span[1] = self.time_span[1].max(other.time_span[1]);
        self.num_time_steps = self.num_time_steps.max(other.num_time_steps);
        if !self.has_time && other.has_time {
            self.has_time = true;
            self.time = other.time;
        }
        self.time_label.clone_from(&other.time_label);
    }

    pub fn copy_to_stream(&self, writer: &mut MessageWriter) {
        writer.write_str(self.data_class_name.as_deref());
        writer.write_i32(self.data_set_type.map_or(-1, DataObjectType::tag));
        writer.write_i32(self.num_data_sets);
        writer.write_i64(self.num_points);
        writer.write_i64(self.num_cells);
        writer.write_i64(self.num_rows);
        writer.write_i64(self.memory_size);
        writer.write_i64(self.polygon_count);
        writer.write_f64(self.time);
        writer.write_bool(self.has_time);
        writer.write_i32(self.num_time_steps);
        writer.write_str(self.time_label.as_deref());
        writer.write_f64_array(&self.bounds.0);
        writer.write_i32_array(&self.extent.0);

        write_nested(writer, |w| self.point_array.copy_to_stream(w));
        for set in [
            &self.point_data,
            &self.cell_data,
            &self.vertex_data,
            &self.edge_data,
            &self.row_data,
        ] {
            write_nested(writer, |w| set.copy_to_stream(w));
        }

        writer.write_str(self.composite_class_name.as_deref());
        writer.write_i32(self.composite_type.map_or(-1, DataObjectType::tag));
        writer.write_str(self.composite_block_name.as_deref());
        write_nested(writer, |w| {
            if let Some(tree) = &self.composite_info {
                tree.copy_to_stream(w);
            }
        });
        write_nested(writer, |w| self.field_data.copy_to_stream(w));
        writer.write_f64_array(&self.time_span);
    }

    /// Replaces this summary with one decoded from `reader`.
    ///
    /// A malformed nested message (array, attribute set, composite tree) is
    /// logged and its partially decoded content is kept; decoding continues
    /// with the next field. A malformed top-level value stops decoding and is
    /// returned, leaving the fields read so far in place.
    pub fn copy_from_stream(&mut self, reader: &mut MessageReader) -> Result<()> {
        self.initialize();
        self.data_class_name = reader.read_str("class name")?;
        self.data_set_type = read_type_tag(reader, "data set type")?;
        self.num_data_sets = reader.read_i32("data set count")?;
        self.num_points = reader.read_i64("point count")?;
        self.num_cells = reader.read_i64("cell count")?;
        self.num_rows = reader.read_i64("row count")?;
        self.memory_size = reader.read_i64("memory size")?;
        self.polygon_count = reader.read_i64("polygon count")?;
        self.time = reader.read_f64("time")?;
        self.has_time = reader.read_bool("has time")?;
        self.num_time_steps = reader.read_i32("time step count")?;
        self.time_label = reader.read_str("time label")?;
        reader.read_f64_array_into(&mut self.bounds.0, "bounds")?;
        reader.read_i32_array_into(&mut self.extent.0, "extent")?;

        let bytes = reader.read_message("point coordinates")?;
        log_nested("point coordinates", |r| self.point_array.copy_from_stream(r), bytes);
        for association in [
            FieldAssociation::Points,
            FieldAssociation::Cells,
            FieldAssociation::Vertices,
            FieldAssociation::Edges,
            FieldAssociation::Rows,
        ] {
            let bytes = reader.read_message("attribute set")?;
            let set = self.attribute_set_mut(association);
            log_nested("attribute set", |r| set.copy_from_stream(r), bytes);
        }

        self.composite_class_name = reader.read_str("composite class name")?;
        self.composite_type = read_type_tag(reader, "composite type")?;
        self.composite_block_name = reader.read_str("composite block name")?;
        let bytes = reader.read_message("composite tree")?;
        if !bytes.is_empty() {
            let mut tree = CompositeTreeStatistics::new();
            log_nested("composite tree", |r| tree.copy_from_stream(r), bytes);
            self.composite_info = Some(tree);
        }
        let bytes = reader.read_message("field data")?;
        log_nested("field data", |r| self.field_data.copy_from_stream(r), bytes);
        reader.read_f64_array_into(&mut self.time_span, "time span")?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = MessageWriter::new();
        self.copy_to_stream(&mut writer);
        writer.finish()
    }

    /// Decodes a summary, failing on the first malformed top-level value.
    pub fn from_bytes(bytes: &[u8]) -> Result<DatasetStatistics> {
        let mut info = DatasetStatistics::new();
        info.copy_from_stream(&mut MessageReader::new(bytes))?;
        Ok(info)
    }
}

/// Applies the per-association merge rule: merge when both sides have elements
/// of that kind, copy when only `other` has, otherwise keep.
fn merge_attribute_set(
    ours: &mut AttributeSetStatistics,
    theirs: &AttributeSetStatistics,
    (we_have, they_have): (bool, bool),
    adding_parts: bool,
) {
    match (we_have, they_have) {
        (true, true) if adding_parts => ours.add_part_information(theirs),
        (true, true) => ours.add_information(theirs),
        (false, true) => ours.deep_copy(theirs),
        _ => {}
    }
}

fn write_nested(writer: &mut MessageWriter, f: impl FnOnce(&mut MessageWriter)) {
    let mut nested = MessageWriter::new();
    f(&mut nested);
    writer.write_message(&nested.finish());
}

fn log_nested(element: &str, f: impl FnOnce(&mut MessageReader) -> Result<()>, bytes: &[u8]) {
    if let Err(e) = f(&mut MessageReader::new(bytes)) {
        log::warn!("malformed {element} message: {e}");
    }
}

fn read_type_tag(reader: &mut MessageReader, element: &str) -> Result<Option<DataObjectType>> {
    let tag = reader.read_i32(element)?;
    if tag < 0 {
        return Ok(None);
    }
    DataObjectType::from_tag(tag)
        .map(Some)
        .ok_or_else(|| Error::decode(element, format!("unknown data object type {tag}")))
}
